use std::{future::IntoFuture, pin::pin, process, sync::Arc};

use apalis::prelude::{Monitor, WorkerBuilder, WorkerFactoryFn};
use apalis_cron::CronStream;
use spotlight::{
    application::{
        auto_feature::AutoFeatureService,
        error::AppError,
        home::HomeFeedService,
        jobs::{AutoFeatureJobContext, auto_feature_schedule, process_auto_feature_job},
    },
    cache::{CacheConfig, CleanupTask, QueryCache},
    config::{self, ScoreArgs},
    domain::engagement::{ActivityGate, EngagementMetrics},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
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

    if let config::Command::Score(args) = &command {
        print!("{}", score_report(args, &settings.auto_feature.policy.gate));
        return Ok(());
    }

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::RunAutoFeature(args) => run_auto_feature_once(settings, args.json).await,
        config::Command::Score(_) => Ok(()),
    }
}

fn score_report(args: &ScoreArgs, gate: &ActivityGate) -> String {
    let metrics = EngagementMetrics::new(args.views, args.likes, args.comments, args.bookmarks);
    format!(
        "score: {}\nactivity gate: {}\n",
        metrics.score(),
        if gate.admits(&metrics) { "open" } else { "closed" }
    )
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = Arc::new(QueryCache::new(&cache_config));
    let cleanup = CleanupTask::spawn(Arc::clone(&cache), cache_config.cleanup_interval());

    let auto_feature = Arc::new(
        AutoFeatureService::new(repositories.clone(), settings.auto_feature.policy)
            .with_cache(Arc::clone(&cache)),
    );
    let home = Arc::new(HomeFeedService::new(
        repositories.clone(),
        Arc::clone(&cache),
        cache_config,
    ));

    let monitor_handle = settings
        .auto_feature
        .schedule
        .as_deref()
        .map(|expression| spawn_auto_feature_monitor(expression, Arc::clone(&auto_feature)))
        .transpose()?;

    if settings.admin.token.is_none() {
        warn!("admin.token is not set; admin endpoints will reject every request");
    }

    let state = HttpState {
        home,
        auto_feature,
        health: repositories,
        admin_token: settings.admin.token.as_deref().map(Arc::from),
    };

    let result = serve_http(&settings, state).await;

    if let Some(handle) = monitor_handle {
        handle.abort();
        let _ = handle.await;
    }
    cleanup.stop().await;

    result
}

async fn run_auto_feature_once(settings: config::Settings, json: bool) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let service = AutoFeatureService::new(repositories, settings.auto_feature.policy);

    let report = service.run().await.map_err(|err| {
        for post_id in err.failed_post_ids() {
            error!(post_id = %post_id, "featured flag write failed");
        }
        AppError::from(err)
    })?;

    if json {
        let rendered = serde_json::to_string(&report)
            .map_err(|err| AppError::unexpected(format!("failed to encode report: {err}")))?;
        println!("{rendered}");
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let url = settings.database.url.as_deref().ok_or_else(|| {
        AppError::from(InfraError::configuration(
            "database.url must be set (or SPOTLIGHT__DATABASE__URL)",
        ))
    })?;

    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err)))?;

    info!(
        max_connections = settings.database.max_connections.get(),
        "database ready"
    );
    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn spawn_auto_feature_monitor(
    expression: &str,
    service: Arc<AutoFeatureService>,
) -> Result<JoinHandle<()>, AppError> {
    let schedule = auto_feature_schedule(expression)
        .map_err(|reason| AppError::from(InfraError::configuration(reason)))?;

    let worker = WorkerBuilder::new("auto-feature-worker")
        .data(AutoFeatureJobContext { service })
        .backend(CronStream::new(schedule))
        .build_fn(process_auto_feature_job);

    let monitor = Monitor::new().register(worker);
    info!(schedule = expression, "auto-feature schedule registered");

    Ok(tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    }))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    let shutdown = Arc::new(Notify::new());
    let trigger = Arc::clone(&shutdown);
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            trigger.notify_one();
        })
        .into_future();
    let mut server = pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| AppError::unexpected(format!("server error: {err}")));
        }
        _ = shutdown.notified() => {}
    }

    // In-flight requests get `graceful_shutdown` to finish.
    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(result) => result.map_err(|err| AppError::unexpected(format!("server error: {err}"))),
        Err(_) => {
            warn!(
                grace_secs = settings.server.graceful_shutdown.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(views: u64, likes: u64, comments: u64, bookmarks: u64) -> ScoreArgs {
        ScoreArgs {
            views,
            likes,
            comments,
            bookmarks,
        }
    }

    #[test]
    fn score_report_uses_the_given_gate() {
        let args = args(150, 0, 0, 0);
        assert_eq!(
            score_report(&args, &ActivityGate::default()),
            "score: 150\nactivity gate: open\n"
        );

        let stricter = ActivityGate {
            min_views: 250,
            ..ActivityGate::default()
        };
        assert_eq!(
            score_report(&args, &stricter),
            "score: 150\nactivity gate: closed\n"
        );
    }
}
