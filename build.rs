fn main() {
    // `sqlx::migrate!` embeds the directory at compile time.
    println!("cargo:rerun-if-changed=migrations");
}
