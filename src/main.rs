use std::{process, sync::Arc};

use folio::{
    application::{
        blog::BlogService,
        content::{ContentService, ContentSource},
        error::AppError,
        repos::ViewCountersRepo,
        views::ViewCounterService,
    },
    config,
    domain::about::AboutContent,
    infra::{
        about::load_about,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, CookiePolicy, HttpState, RouterState},
        memory::MemoryViewCounters,
        notion::{NotionClient, NotionContentSource},
        telemetry,
    },
};
use sqlx::PgPool;
use tokio::{sync::Notify, task::JoinHandle};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let views_repo = init_view_store(&settings).await?;
    let about = load_about(&settings.site.about_file).await?;
    let state = build_router_state(&settings, views_repo, about)?;
    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = connect_database(database_url, &settings).await?;
    info!(target = "folio::migrate", "migrations applied");
    pool.close().await;
    Ok(())
}

async fn connect_database(url: &str, settings: &config::Settings) -> Result<PgPool, AppError> {
    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(pool)
}

async fn init_view_store(
    settings: &config::Settings,
) -> Result<Arc<dyn ViewCountersRepo>, AppError> {
    match settings.database.url.as_deref() {
        Some(url) => {
            let pool = connect_database(url, settings).await?;
            Ok(Arc::new(PostgresRepositories::new(pool)))
        }
        None => {
            warn!(
                target = "folio::startup",
                "database.url is not set; view counters are kept in memory and reset on restart"
            );
            Ok(Arc::new(MemoryViewCounters::new()))
        }
    }
}

fn build_router_state(
    settings: &config::Settings,
    views_repo: Arc<dyn ViewCountersRepo>,
    about: AboutContent,
) -> Result<RouterState, AppError> {
    if settings.notion.token.is_none() {
        warn!(
            target = "folio::startup",
            "notion.token is not set; post and project pages will be empty"
        );
    }

    info!(
        target = "folio::startup",
        body_format = settings.notion.body_format.as_str(),
        max_attempts = settings.retry.max_attempts.get(),
        "content source configured"
    );

    let retry = settings.retry.policy();
    let client = NotionClient::new(&settings.notion, retry)?;
    let source: Arc<dyn ContentSource> =
        Arc::new(NotionContentSource::new(client, &settings.notion));

    let content = ContentService::new(source);
    let views = ViewCounterService::new(views_repo, retry);
    let blog = BlogService::new(
        content.clone(),
        views.clone(),
        Arc::new(about),
        settings.site.clone(),
    );

    let cookies = CookiePolicy::from_settings(&settings.views);
    Ok(RouterState {
        http: HttpState {
            blog: Arc::new(blog),
            cookies,
        },
        api: ApiState {
            views: Arc::new(views),
            content: Arc::new(content),
            cookies,
        },
    })
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let addr = settings.server.addr;
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::from(InfraError::Bind { addr, source }))?;
    info!(target = "folio::startup", %addr, "listening");

    let shutdown = Arc::new(Notify::new());
    let notified = Arc::clone(&shutdown);
    let mut server: JoinHandle<std::io::Result<()>> = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move { notified.notified().await })
            .await
    });

    tokio::select! {
        result = &mut server => return server_result(result),
        () = shutdown_signal() => {
            info!(target = "folio::shutdown", "shutdown signal received; draining connections");
            shutdown.notify_one();
        }
    }

    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(result) => server_result(result),
        Err(_) => {
            warn!(
                target = "folio::shutdown",
                timeout_secs = settings.server.graceful_shutdown.as_secs(),
                "graceful shutdown timed out"
            );
            Ok(())
        }
    }
}

fn server_result(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::unexpected(format!("server error: {err}"))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "folio::shutdown", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "folio::shutdown", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
