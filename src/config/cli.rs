use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the newsroom binary.
#[derive(Debug, Parser)]
#[command(name = "newsroom", version, about = "Cached news, topic and tag catalogue")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "NEWSROOM_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings overrides accepted by every subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT", global = true)]
    pub database_max_connections: Option<u32>,

    /// Override how reads share the pool (pooled|serialized).
    #[arg(long = "database-read-discipline", value_name = "MODE", global = true)]
    pub database_read_discipline: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Manage tags.
    Tags(TagsArgs),
    /// Manage topics.
    Topics(TopicsArgs),
    /// Manage news articles.
    News(NewsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum TagsCommand {
    /// List all tags, newest first.
    List,
    /// Create a tag.
    Add {
        #[arg(value_name = "LABEL")]
        label: String,
    },
    /// Rename a tag.
    Edit {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "LABEL")]
        label: String,
    },
    /// Delete a tag.
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct TopicsArgs {
    #[command(subcommand)]
    pub command: TopicsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum TopicsCommand {
    /// List all topics, newest first.
    List,
    /// Create a topic.
    Add {
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(long, default_value = "")]
        headline: String,
    },
    /// Replace a topic's title and headline.
    Edit {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(long, default_value = "")]
        headline: String,
    },
    /// Delete a topic.
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct NewsArgs {
    #[command(subcommand)]
    pub command: NewsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum NewsCommand {
    /// List news, optionally filtered by topic and status.
    List {
        #[arg(long = "topic-id", value_name = "ID")]
        topic_id: Option<String>,
        /// Status to filter by; 0 means any.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        status: i32,
    },
    /// Create a news article.
    Add(NewsFields),
    /// Replace a news article and its tags.
    Edit {
        #[arg(value_name = "ID")]
        id: String,
        #[command(flatten)]
        fields: NewsFields,
    },
    /// Delete a news article.
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct NewsFields {
    #[arg(long = "topic-id", value_name = "ID")]
    pub topic_id: String,

    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub content: String,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub status: i32,

    /// Tag to associate; repeat for several.
    #[arg(long = "tag-id", value_name = "ID")]
    pub tag_ids: Vec<String>,
}
