//! ファイルレジストリ
//!
//! 取り込んだファイルを表示順（登録順）に保持し、行ごとの変換状態と
//! 変換結果を管理する。UI層へは `ViewEvent` で変更を通知する。

use crate::error::{Error, Result};
use crate::locator::LocatorStore;
use crate::types::{ConvertedArtifact, IncomingFile, MimeType, UploadedFile};
use crate::view::{format_summary, ConversionStatus, RowViewState};

/// 1ファイルの上限サイズ（5MB）
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// UI層への通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// 操作ボタン・テーブル・進捗表示の表示切替
    Visibility(bool),
    RowAdded(String),
    RowUpdated(String),
    RowRemoved(String),
    Cleared,
}

/// `accept` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Registered,
    /// 同名ファイルが登録済み（何もしない）
    Duplicate,
}

/// レジストリの1エントリ
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub file: UploadedFile,
    pub artifact: Option<ConvertedArtifact>,
    pub status: ConversionStatus,
}

impl RegistryEntry {
    pub fn row(&self) -> RowViewState {
        RowViewState::derive(&self.file, self.artifact.as_ref(), &self.status)
    }
}

pub struct FileRegistry<L: LocatorStore> {
    entries: Vec<RegistryEntry>,
    locators: L,
    allow_webp: bool,
    next_id: u64,
    events: Vec<ViewEvent>,
}

impl<L: LocatorStore> FileRegistry<L> {
    pub fn new(locators: L) -> Self {
        Self {
            entries: Vec::new(),
            locators,
            allow_webp: false,
            next_id: 0,
            events: Vec::new(),
        }
    }

    /// WebPの再圧縮を受け付ける
    pub fn with_webp_input(mut self, allow: bool) -> Self {
        self.allow_webp = allow;
        self
    }

    pub fn allowed_types(&self) -> Vec<MimeType> {
        let mut types = vec![MimeType::Jpeg, MimeType::Png];
        if self.allow_webp {
            types.push(MimeType::Webp);
        }
        types
    }

    fn allowed_label(&self) -> String {
        let labels: Vec<&str> = self.allowed_types().iter().map(|t| t.label()).collect();
        match labels.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
            Some((last, _)) => last.to_string(),
            None => String::new(),
        }
    }

    /// ファイルを検証して登録する
    pub fn accept(&mut self, incoming: IncomingFile) -> Result<Admission> {
        let mime_type = MimeType::parse(&incoming.mime_type)
            .filter(|t| self.allowed_types().contains(t))
            .ok_or_else(|| Error::InvalidType {
                name: incoming.name.clone(),
                allowed: self.allowed_label(),
            })?;

        let size_bytes = incoming.size_bytes();
        if size_bytes > MAX_FILE_SIZE {
            return Err(Error::TooLarge {
                name: incoming.name,
                size: size_bytes,
            });
        }

        if self.contains(&incoming.name) {
            return Ok(Admission::Duplicate);
        }

        self.next_id += 1;
        let was_empty = self.entries.is_empty();
        let name = incoming.name;

        self.entries.push(RegistryEntry {
            file: UploadedFile {
                id: self.next_id,
                name: name.clone(),
                size_bytes,
                mime_type,
                payload: incoming.payload,
            },
            artifact: None,
            status: ConversionStatus::Pending,
        });
        self.events.push(ViewEvent::RowAdded(name));

        if was_empty {
            self.events.push(ViewEvent::Visibility(true));
        }

        Ok(Admission::Registered)
    }

    /// 複数ファイルを個別に検証して登録する（1件の失敗は他に影響しない）
    pub fn accept_all<I>(&mut self, files: I) -> Vec<(String, Result<Admission>)>
    where
        I: IntoIterator<Item = IncomingFile>,
    {
        files
            .into_iter()
            .map(|file| {
                let name = file.name.clone();
                (name, self.accept(file))
            })
            .collect()
    }

    /// ファイルと変換結果を削除する
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.file.name == name) else {
            return false;
        };

        let entry = self.entries.remove(index);
        if let Some(artifact) = entry.artifact {
            self.locators.release(&artifact.locator);
        }
        self.events.push(ViewEvent::RowRemoved(entry.file.name));

        if self.entries.is_empty() {
            self.events.push(ViewEvent::Visibility(false));
        }
        true
    }

    /// 全ファイルと全変換結果を削除する
    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }

        for entry in self.entries.drain(..) {
            if let Some(artifact) = entry.artifact {
                self.locators.release(&artifact.locator);
            }
        }
        self.events.push(ViewEvent::Cleared);
        self.events.push(ViewEvent::Visibility(false));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 操作ボタン・テーブルを表示するか
    pub fn is_visible(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.file.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.file.name == name)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.file.name.clone()).collect()
    }

    pub fn rows(&self) -> Vec<RowViewState> {
        self.entries.iter().map(RegistryEntry::row).collect()
    }

    pub fn row(&self, name: &str) -> Option<RowViewState> {
        self.get(name).map(RegistryEntry::row)
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.file.size_bytes).sum()
    }

    pub fn summary(&self) -> String {
        format_summary(self.entries.len(), self.total_size())
    }

    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn locators(&self) -> &L {
        &self.locators
    }

    pub fn locators_mut(&mut self) -> &mut L {
        &mut self.locators
    }

    fn entry_by_id_mut(&mut self, id: u64) -> Option<&mut RegistryEntry> {
        self.entries.iter_mut().find(|e| e.file.id == id)
    }

    /// 変換開始。進捗を0に戻してファイルを返す。
    pub fn begin_conversion(&mut self, name: &str) -> Option<UploadedFile> {
        let entry = self.entries.iter_mut().find(|e| e.file.name == name)?;
        entry.status = ConversionStatus::InFlight { progress: 0 };
        let file = entry.file.clone();
        self.events.push(ViewEvent::RowUpdated(file.name.clone()));
        Some(file)
    }

    /// 進捗を進める。後退はしない。行が無ければ何もしない。
    pub fn advance_progress(&mut self, id: u64, progress: u8) -> bool {
        let Some(entry) = self.entry_by_id_mut(id) else {
            return false;
        };
        let ConversionStatus::InFlight { progress: current } = &mut entry.status else {
            return false;
        };
        if progress <= *current {
            return false;
        }
        *current = progress.min(100);
        let name = entry.file.name.clone();
        self.events.push(ViewEvent::RowUpdated(name));
        true
    }

    /// 変換結果を公開する
    ///
    /// 既存の結果があれば先に解放してから新しいロケータを発行する。
    /// 行が削除済みの場合は何も公開せず `Ok(None)` を返す。
    pub fn publish(
        &mut self,
        id: u64,
        file_name: &str,
        size_bytes: u64,
        payload: &[u8],
    ) -> Result<Option<ConvertedArtifact>> {
        let Some(index) = self.entries.iter().position(|e| e.file.id == id) else {
            return Ok(None);
        };

        if let Some(previous) = self.entries[index].artifact.take() {
            self.locators.release(&previous.locator);
        }

        let entry = &mut self.entries[index];
        let name = entry.file.name.clone();

        match self.locators.publish(file_name, payload) {
            Ok(locator) => {
                let artifact = ConvertedArtifact {
                    source_name: name.clone(),
                    file_name: file_name.to_string(),
                    size_bytes,
                    locator,
                };
                entry.artifact = Some(artifact.clone());
                entry.status = ConversionStatus::Converted;
                self.events.push(ViewEvent::RowUpdated(name));
                Ok(Some(artifact))
            }
            Err(e) => {
                entry.status = ConversionStatus::Failed { reason: e.to_string() };
                self.events.push(ViewEvent::RowUpdated(name));
                Err(e)
            }
        }
    }

    /// 変換失敗を記録する。以前の結果は残す。
    pub fn mark_failed(&mut self, id: u64, reason: impl Into<String>) -> bool {
        let Some(entry) = self.entry_by_id_mut(id) else {
            return false;
        };
        entry.status = ConversionStatus::Failed { reason: reason.into() };
        let name = entry.file.name.clone();
        self.events.push(ViewEvent::RowUpdated(name));
        true
    }
}
