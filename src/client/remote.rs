//! アップロード変換クライアント
//!
//! 1. 登録済みファイルを1件ずつ `/uploads` に送る（失敗したファイルは登録から外す）
//! 2. `/convert` に品質とファイル一覧を送る
//! 3. レスポンスの `fileName` で行を特定して結果を反映する
//!
//! 出力名（`<stem>.webp`）が同じになるファイルは、先に登録された1件だけを変換する。

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use tracing::{info, warn};
use webp_converter_common::{
    ConversionJob, ConvertRequest, ConvertedFileInfo, ErrorResponse, FileRef, FilesResponse, JobOutcome, Session,
    UploadedFile, UploadedFileInfo, UPLOAD_FIELD,
};

use super::locators::RemoteLocators;
use crate::error::{ConverterError, Result};

#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    base: Url,
}

impl RemoteClient {
    pub fn new(base: &str) -> Result<Self> {
        // 末尾スラッシュが無いと join でパスが置き換わる
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        let base = Url::parse(&base).map_err(|e| ConverterError::Config(format!("サーバーURLが不正です: {}", e)))?;

        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| ConverterError::Config(format!("URLが不正です: {}", e)))
    }

    /// 1ファイルをアップロード
    pub async fn upload(&self, file: &UploadedFile) -> Result<Vec<UploadedFileInfo>> {
        let part = Part::bytes(file.payload.to_vec())
            .file_name(file.name.clone())
            .mime_str(file.mime_type.as_str())?;
        // ファイル名はそのまま送る（サーバー側で保存名に使う）
        let form = Form::new().percent_encode_noop().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(self.endpoint("uploads")?)
            .multipart(form)
            .send()
            .await?;

        let body: FilesResponse<UploadedFileInfo> = parse_response(response).await?;
        Ok(body.files)
    }

    /// サーバー側で変換
    pub async fn convert(&self, request: &ConvertRequest) -> Result<Vec<ConvertedFileInfo>> {
        let response = self
            .http
            .post(self.endpoint("convert")?)
            .json(request)
            .send()
            .await?;

        let body: FilesResponse<ConvertedFileInfo> = parse_response(response).await?;
        Ok(body.files)
    }

    /// 変換済みファイルを取得
    pub async fn download(&self, file_name: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.endpoint(&format!("webp/{}", file_name))?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ConverterError::FileNotFound(file_name.to_string()));
        }
        let response = response.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or(text);

    Err(ConverterError::Server {
        status: status.as_u16(),
        message,
    })
}

/// アップロードからサーバー変換までを実行する
///
/// 通信エラーは自動で再試行しない。変換リクエスト自体が失敗した場合は
/// 全行を失敗として確定させる。
pub async fn convert_remote(
    session: &mut Session<RemoteLocators>,
    client: &RemoteClient,
) -> Result<Vec<(String, JobOutcome)>> {
    if session.registry().is_empty() {
        return Err(ConverterError::NoFilesToConvert);
    }

    // 1. アップロード
    let files: Vec<UploadedFile> = session
        .registry()
        .entries()
        .iter()
        .map(|e| e.file.clone())
        .collect();

    for file in &files {
        match client.upload(file).await {
            Ok(_) => info!(file = %file.name, "uploaded"),
            Err(e) => {
                warn!(file = %file.name, error = %e, "upload failed, dropping file");
                session.registry_mut().remove(&file.name);
            }
        }
    }

    // 2. 変換
    let jobs = session.start_conversions();
    if jobs.is_empty() {
        return Err(ConverterError::NoFilesToConvert);
    }

    // 出力名が重なるファイルはサーバー上で上書きし合うので、先に登録された方だけ送る
    let mut outcomes = Vec::new();
    let mut sendable: Vec<&ConversionJob> = Vec::new();
    for job in &jobs {
        match sendable.iter().find(|j| j.output_name == job.output_name) {
            Some(first) => {
                let reason = format!("output name {} is already used by {}", job.output_name, first.name);
                warn!(file = %job.name, %reason, "skipping conversion");
                session.registry_mut().mark_failed(job.id, reason.clone());
                outcomes.push((job.name.clone(), JobOutcome::Failed(reason)));
            }
            None => sendable.push(job),
        }
    }

    let request = ConvertRequest {
        compression_level: session.quality().into(),
        files: sendable
            .iter()
            .map(|j| FileRef {
                file_name: j.name.clone(),
            })
            .collect(),
    };

    let mut converted = match client.convert(&request).await {
        Ok(files) => files,
        Err(e) => {
            warn!(error = %e, "conversion request failed");
            for job in &sendable {
                session.registry_mut().mark_failed(job.id, e.to_string());
            }
            return Err(e);
        }
    };

    // 3. 結果の反映（インデックスではなく出力ファイル名で対応付け、1件は1行にだけ使う）
    for job in sendable {
        let matched = converted
            .iter()
            .position(|c| c.file_name == job.output_name)
            .map(|index| converted.remove(index));

        let outcome = match matched {
            Some(info) => match session
                .registry_mut()
                .publish(job.id, &info.file_name, info.size, &[])
            {
                Ok(Some(artifact)) => JobOutcome::Converted(artifact),
                Ok(None) => JobOutcome::Discarded,
                Err(e) => JobOutcome::Failed(e.to_string()),
            },
            None => {
                let reason = "server did not convert this file".to_string();
                session.registry_mut().mark_failed(job.id, reason.clone());
                JobOutcome::Failed(reason)
            }
        };
        outcomes.push((job.name.clone(), outcome));
    }

    Ok(outcomes)
}
