//! ローカル変換ドライバ
//!
//! 登録済みファイルをそれぞれ独立したタスクで圧縮する。
//! セッションのロックは各行の更新時にだけ取る。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use webp_converter_common::{
    compress_with_retries, AttemptOutcome, Compressed, Compressor, ConversionJob, JobOutcome,
    LocatorStore, Session,
};

use crate::error::{ConverterError, Result};

pub type SharedSession<L> = Arc<Mutex<Session<L>>>;

pub fn shared<L: LocatorStore>(session: Session<L>) -> SharedSession<L> {
    Arc::new(Mutex::new(session))
}

fn lock<L: LocatorStore>(session: &Mutex<Session<L>>) -> MutexGuard<'_, Session<L>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 全ファイルを変換する
///
/// 1ファイルの失敗は他のファイルに影響しない。`on_done` は各ファイルの
/// 結果が反映されるたびに呼ばれる。結果は完了順に返す。
pub async fn convert_all<L, C, F>(
    session: &SharedSession<L>,
    compressor: Arc<C>,
    on_done: F,
) -> Result<Vec<(String, JobOutcome)>>
where
    L: LocatorStore + Send + 'static,
    C: Compressor + 'static,
    F: Fn(&str, &JobOutcome) + Send + Sync + 'static,
{
    let jobs = lock(session).start_conversions();
    if jobs.is_empty() {
        return Err(ConverterError::NoFilesToConvert);
    }

    info!(count = jobs.len(), quality = jobs[0].options.initial_quality, "starting conversion");

    let on_done = Arc::new(on_done);
    let mut tasks = JoinSet::new();

    for job in jobs {
        let session = Arc::clone(session);
        let compressor = Arc::clone(&compressor);
        let on_done = Arc::clone(&on_done);

        tasks.spawn(async move {
            let outcome = convert_one(session, compressor, &job).await;
            on_done(&job.name, &outcome);
            (job.name, outcome)
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => warn!(error = %e, "conversion task aborted"),
        }
    }

    Ok(outcomes)
}

async fn convert_one<L, C>(session: SharedSession<L>, compressor: Arc<C>, job: &ConversionJob) -> JobOutcome
where
    L: LocatorStore + Send + 'static,
    C: Compressor + 'static,
{
    let result = if job.options.use_web_worker {
        let session = Arc::clone(&session);
        let job = job.clone();
        match tokio::task::spawn_blocking(move || run_attempts(&session, compressor.as_ref(), &job)).await {
            Ok(result) => result,
            Err(e) => Err(webp_converter_common::Error::Compression(format!("worker failed: {}", e))),
        }
    } else {
        run_attempts(&session, compressor.as_ref(), job)
    };

    let outcome = lock(&session).finish(job, result);

    match &outcome {
        JobOutcome::Converted(artifact) => info!(
            file = %job.name,
            size = artifact.size_bytes,
            locator = %artifact.locator,
            "converted"
        ),
        JobOutcome::Failed(reason) => warn!(file = %job.name, %reason, "conversion failed"),
        JobOutcome::Discarded => debug!(file = %job.name, "row removed during conversion, result discarded"),
    }

    outcome
}

fn run_attempts<L, C>(
    session: &Mutex<Session<L>>,
    compressor: &C,
    job: &ConversionJob,
) -> webp_converter_common::Result<Compressed>
where
    L: LocatorStore,
    C: Compressor + ?Sized,
{
    compress_with_retries(
        compressor,
        &job.payload,
        &job.options,
        |attempt| {
            debug!(file = %job.name, attempt = attempt.index + 1, quality = attempt.quality, "compressing");
            lock(session).record_attempt(job, attempt.index);
        },
        |attempt, outcome| match outcome {
            AttemptOutcome::Smaller { size } => {
                debug!(file = %job.name, attempt = attempt.index + 1, size, "compression succeeded")
            }
            AttemptOutcome::NotSmaller { size } => debug!(
                file = %job.name,
                attempt = attempt.index + 1,
                size,
                "output not smaller than input, lowering quality"
            ),
            AttemptOutcome::Failed { reason } => {
                warn!(file = %job.name, attempt = attempt.index + 1, %reason, "compression error")
            }
        },
    )
}
