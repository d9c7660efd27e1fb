//! 変換セッション
//!
//! レジストリと圧縮品質をひとまとめにしたコントローラ。
//! ドライバはここから変換ジョブを取り出し、結果を書き戻す。

use crate::compress::{CompressionOptions, Compressed, MAX_ATTEMPTS};
use crate::error::Result;
use crate::locator::LocatorStore;
use crate::registry::FileRegistry;
use crate::types::{webp_file_name, CompressionQuality, ConvertedArtifact};
use std::sync::Arc;

/// 1ファイル分の変換ジョブ（開始時点の品質を保持）
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub id: u64,
    pub name: String,
    pub output_name: String,
    pub payload: Arc<[u8]>,
    pub options: CompressionOptions,
}

/// 変換結果の反映
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Converted(ConvertedArtifact),
    Failed(String),
    /// 行が削除済みのため破棄
    Discarded,
}

/// 試行開始時の進捗値（30, 60, 90）
pub fn progress_for_attempt(index: u32) -> u8 {
    (((index + 1).min(MAX_ATTEMPTS) * 90) / MAX_ATTEMPTS) as u8
}

pub struct Session<L: LocatorStore> {
    registry: FileRegistry<L>,
    quality: CompressionQuality,
}

impl<L: LocatorStore> Session<L> {
    pub fn new(registry: FileRegistry<L>) -> Self {
        Self {
            registry,
            quality: CompressionQuality::default(),
        }
    }

    pub fn with_quality(mut self, quality: CompressionQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn quality(&self) -> CompressionQuality {
        self.quality
    }

    /// 以降に開始する変換にのみ反映される
    pub fn set_quality(&mut self, quality: CompressionQuality) {
        self.quality = quality;
    }

    pub fn registry(&self) -> &FileRegistry<L> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FileRegistry<L> {
        &mut self.registry
    }

    /// 登録済み全ファイルの変換を開始する
    pub fn start_conversions(&mut self) -> Vec<ConversionJob> {
        let options = CompressionOptions::new(self.quality);

        self.registry
            .names()
            .into_iter()
            .filter_map(|name| self.registry.begin_conversion(&name))
            .map(|file| ConversionJob {
                id: file.id,
                output_name: webp_file_name(&file.name),
                name: file.name,
                payload: file.payload,
                options: options.clone(),
            })
            .collect()
    }

    /// 試行開始を進捗に反映する
    pub fn record_attempt(&mut self, job: &ConversionJob, index: u32) -> bool {
        self.registry.advance_progress(job.id, progress_for_attempt(index))
    }

    /// 圧縮結果を反映する
    pub fn finish(&mut self, job: &ConversionJob, result: Result<Compressed>) -> JobOutcome {
        match result {
            Ok(compressed) => {
                let size = compressed.bytes.len() as u64;
                match self.registry.publish(job.id, &job.output_name, size, &compressed.bytes) {
                    Ok(Some(artifact)) => JobOutcome::Converted(artifact),
                    Ok(None) => JobOutcome::Discarded,
                    Err(e) => JobOutcome::Failed(e.to_string()),
                }
            }
            Err(e) => {
                let reason = e.to_string();
                if self.registry.mark_failed(job.id, reason.clone()) {
                    JobOutcome::Failed(reason)
                } else {
                    JobOutcome::Discarded
                }
            }
        }
    }
}
