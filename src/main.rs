use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use ad_generator_hw::{
    app_state::AppState,
    config::AppConfig,
    routes,
    services::{
        compositor::Compositor,
        generator::OpenAiImageClient,
        pipeline::AdPipeline,
        queue::JobQueue,
        registry::JobRegistry,
        storage::{AssetUploader, LocalStore, S3Uploader},
        worker::WorkerPool,
    },
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing ad-generator-hw server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    // Register application metrics
    metrics::describe_histogram!(
        "ad_job_duration_seconds",
        "Time to process an ad generation job"
    );
    metrics::describe_counter!("ad_jobs_submitted_total", "Total ad generation jobs submitted");
    metrics::describe_counter!("ad_jobs_completed_total", "Total ad generation jobs completed");
    metrics::describe_counter!("ad_jobs_failed_total", "Total ad generation jobs that failed");
    metrics::describe_gauge!("ad_queue_depth", "Current number of jobs waiting for a worker");

    // Initialize image provider client
    tracing::info!(model = %config.openai_image_model, "Initializing image generation client");
    let generator = OpenAiImageClient::new(
        &config.openai_base_url,
        &config.openai_api_key,
        &config.openai_image_model,
        &config.image_size,
        Duration::from_secs(config.generation_timeout_secs),
    )
    .expect("Failed to initialize image generation client");

    // Load brand assets
    let compositor = Compositor::from_paths(
        config.product_image_path.as_deref(),
        config.logo_path.as_deref(),
        config.product_scale,
        config.logo_scale,
        config.logo_position,
    )
    .expect("Failed to load brand assets");
    if compositor.is_some() {
        tracing::info!("Brand compositing enabled");
    }

    // Initialize S3 uploader when configured
    let uploader: Option<Arc<dyn AssetUploader>> = match config
        .s3()
        .expect("Invalid S3 configuration")
    {
        Some(s3) => {
            tracing::info!(bucket = %s3.bucket, region = %s3.region, "Initializing S3 uploader");
            let uploader = S3Uploader::new(
                s3.bucket,
                s3.region,
                s3.endpoint,
                s3.access_key,
                s3.secret_key,
                config.presign_expiry_secs,
            )
            .expect("Failed to initialize S3 uploader");
            Some(Arc::new(uploader) as Arc<dyn AssetUploader>)
        }
        None => {
            tracing::info!(output_dir = %config.output_dir.display(), "S3 not configured, serving local paths");
            None
        }
    };

    let pipeline = Arc::new(AdPipeline::new(
        Arc::new(generator),
        compositor,
        LocalStore::new(config.output_dir.clone()),
        uploader,
    ));

    // Start worker pool
    let registry = Arc::new(JobRegistry::new());
    let (queue, receiver) = JobQueue::new(config.queue_capacity);
    let workers = WorkerPool::spawn(
        config.worker_count,
        receiver,
        Arc::clone(&registry),
        pipeline,
    );
    tracing::info!(
        workers = workers.size(),
        queue_capacity = config.queue_capacity,
        "Worker pool started"
    );

    // Create shared application state
    let state = AppState::new(registry, queue, &config.service_api_key);

    // Build API routes
    let app = routes::router(state).merge(routes::metrics_router(prometheus_handle));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // The router (and with it every queue sender) is gone; let workers drain.
    tracing::info!("Waiting for in-flight jobs to finish");
    workers.join().await;
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
