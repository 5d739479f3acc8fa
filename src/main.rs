use std::{
    io::{self, Write},
    process,
    sync::Arc,
};

use newsroom::{
    application::{
        coordinator::{Coordinator, NewsDraft},
        error::AppError,
    },
    cache::{CacheStore, MemoryCache},
    config::{self, Command, NewsCommand, NewsFields, TagsCommand, TopicsCommand},
    domain::filter::NewsFilter,
    infra::{db::PostgresRepositories, error::InfraError, telemetry},
};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{Dispatch, Level, debug, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(source = report.source, causes = ?report.messages, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(source = report.source, causes = ?report.messages, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let pool = connect(&settings).await?;

    if matches!(cli_args.command, Command::Migrate) {
        run_migrations(&pool).await?;
        info!("database migrations applied");
        return Ok(());
    }
    if settings.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let repositories = PostgresRepositories::new(pool, settings.database.read_discipline);
    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    debug!(
        read_discipline = ?settings.database.read_discipline,
        "database ready"
    );

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let coordinator = Coordinator::new(Arc::new(repositories), cache);

    match cli_args.command {
        Command::Migrate => Ok(()),
        Command::Tags(args) => run_tags(&coordinator, args.command).await,
        Command::Topics(args) => run_topics(&coordinator, args.command).await,
        Command::News(args) => run_news(&coordinator, args.command).await,
    }
}

async fn connect(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(
        database_url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    PostgresRepositories::run_migrations(pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))
}

async fn run_tags(coordinator: &Coordinator, command: TagsCommand) -> Result<(), AppError> {
    match command {
        TagsCommand::List => print_json(&coordinator.get_tags().await?),
        TagsCommand::Add { label } => print_json(&coordinator.add_tag(&label).await?),
        TagsCommand::Edit { id, label } => print_json(&coordinator.edit_tag(&id, &label).await?),
        TagsCommand::Delete { id } => {
            coordinator.delete_tag(&id).await?;
            print_json(&Deleted { deleted: &id })
        }
    }
}

async fn run_topics(coordinator: &Coordinator, command: TopicsCommand) -> Result<(), AppError> {
    match command {
        TopicsCommand::List => print_json(&coordinator.get_topics().await?),
        TopicsCommand::Add { title, headline } => {
            print_json(&coordinator.add_topic(&title, &headline).await?)
        }
        TopicsCommand::Edit {
            id,
            title,
            headline,
        } => print_json(&coordinator.edit_topic(&id, &title, &headline).await?),
        TopicsCommand::Delete { id } => {
            coordinator.delete_topic(&id).await?;
            print_json(&Deleted { deleted: &id })
        }
    }
}

async fn run_news(coordinator: &Coordinator, command: NewsCommand) -> Result<(), AppError> {
    match command {
        NewsCommand::List { topic_id, status } => {
            let filter = NewsFilter::new(topic_id.unwrap_or_default(), status);
            print_json(&coordinator.get_newses(&filter).await?)
        }
        NewsCommand::Add(fields) => print_json(&coordinator.add_news(draft(fields)).await?),
        NewsCommand::Edit { id, fields } => {
            print_json(&coordinator.edit_news(&id, draft(fields)).await?)
        }
        NewsCommand::Delete { id } => {
            coordinator.delete_news(&id).await?;
            print_json(&Deleted { deleted: &id })
        }
    }
}

fn draft(fields: NewsFields) -> NewsDraft {
    NewsDraft {
        topic_id: fields.topic_id,
        title: fields.title,
        content: fields.content,
        status: fields.status,
        tag_ids: fields.tag_ids,
    }
}

#[derive(Serialize)]
struct Deleted<'a> {
    deleted: &'a str,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(InfraError::from)?;
    writeln!(stdout).map_err(|err| AppError::unexpected(format!("failed to write output: {err}")))
}
