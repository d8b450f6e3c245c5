use std::{process, sync::Arc};

use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use vitrine::{
    actions::ActionDispatcher,
    application::{AppError, Storefront},
    cache::CacheStore,
    config::{self, ActAction, ActArgs, Command, PlanArgs, RecentAction, RecentArgs, Settings},
    fetch::{FetchConfig, FetchOrchestrator},
    infra::{http::ApiClient, telemetry},
    layout::{LayoutComposer, LayoutConfig},
    notify::{Notifier, ToastKind},
    session::{AuthSession, AuthToken, FileKvStore, RecentlyViewed, RecentlyViewedConfig},
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, category = error.category(), "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, category = error.category(), "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    let command = cli_args.command.unwrap_or_default();

    telemetry::init(&settings.logging)?;
    info!(
        api = %settings.api.base_url,
        version = env!("CARGO_PKG_VERSION"),
        "vitrine starting"
    );

    match command {
        Command::Plan(args) => run_plan(&settings, args).await,
        Command::Recent(args) => run_recent(&settings, args).await,
        Command::Act(args) => run_act(&settings, args).await,
    }
}

fn session_from(token: Option<String>) -> Arc<AuthSession> {
    Arc::new(AuthSession::new(token.and_then(AuthToken::new)))
}

async fn run_plan(settings: &Settings, args: PlanArgs) -> Result<(), AppError> {
    if args.page == Some(0) {
        return Err(AppError::validation("--page starts at 1"));
    }

    let client = Arc::new(ApiClient::from_settings(&settings.api)?);
    let session = session_from(args.token);
    let notifier = Arc::new(Notifier::new());

    let orchestrator = Arc::new(FetchOrchestrator::new(
        FetchConfig::from(settings),
        Arc::new(CacheStore::new()),
        client,
        session.clone(),
        notifier.clone(),
    ));
    let storefront = Storefront::new(
        orchestrator.clone(),
        LayoutComposer::new(LayoutConfig::from(&settings.catalog)),
        session,
        notifier,
    );

    let plan = storefront.plan(args.page).await;
    orchestrator.detach();

    print_json(&plan, args.pretty)
}

async fn run_recent(settings: &Settings, args: RecentArgs) -> Result<(), AppError> {
    let store = Arc::new(FileKvStore::new(settings.recent.path.clone()));
    let recent = RecentlyViewed::new(store, RecentlyViewedConfig::from(&settings.recent));

    match args.action {
        RecentAction::List => {
            let views = recent.list().await?;
            print_json(&views, false)
        }
        RecentAction::Record { product_id } => {
            recent.record(&AuthSession::guest(), &product_id).await?;
            info!(product_id = %product_id, "View recorded");
            Ok(())
        }
        RecentAction::Clear => {
            recent.clear().await?;
            info!("Recently viewed list cleared");
            Ok(())
        }
    }
}

async fn run_act(settings: &Settings, args: ActArgs) -> Result<(), AppError> {
    let client = Arc::new(ApiClient::from_settings(&settings.api)?);
    let session = session_from(args.token);
    let notifier = Arc::new(Notifier::new());
    let actions = ActionDispatcher::new(client, session.clone(), notifier.clone());

    let outcome = match args.action {
        ActAction::AddToCart {
            product_id,
            quantity,
        } => actions.add_to_cart(&product_id, quantity).await,
        ActAction::Wishlist { product_id } => actions.toggle_wishlist(&product_id).await,
        ActAction::ClearSearches => actions.clear_recent_searches().await,
    };

    for toast in notifier.drain() {
        match toast.kind {
            ToastKind::Error => warn!(text = %toast.text, "Action failed"),
            ToastKind::Success | ToastKind::Info => info!(text = %toast.text, "Action finished"),
        }
    }
    if let Some(path) = session.take_login_redirect() {
        warn!(login = path, "Sign in again to continue");
    }

    let ack = outcome?;
    print_json(&ack, false)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), AppError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|err| AppError::unexpected(format!("failed to serialize output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
