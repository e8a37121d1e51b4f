//! Session operations behind the HTTP routes: upload, ask, settings, chat.

use std::sync::Arc;

use ai_llm_service::{
    HealthStatus,
    config::default_config::{MAX_TEMPERATURE, MIN_TEMPERATURE, validate_temperature},
};
use contextor::{Progress, SourceNode};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use upload_store::{fingerprint, is_pdf_file_name};

use crate::{
    core::{
        app_state::AppState,
        session::{ChatTurn, IndexedFile, ModelSettings, Role, SharedSession},
    },
    error_handler::{AppError, AppResult},
};

/// Reply to a question asked before any successful upload.
pub const NO_DOCUMENT_WARNING: &str = "Please upload a PDF first.";

/// Granularity of the temperature control.
pub const TEMPERATURE_STEP: f32 = 0.05;

#[derive(Debug, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub file_name: String,
    pub indexed: bool,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    Answer,
    Warning,
}

#[derive(Debug, Serialize)]
pub struct AskOutcome {
    pub kind: AnswerKind,
    pub message: String,
    pub sources: Vec<SourceNode>,
}

/// Partial settings update; absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub chat_model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub embed_model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemperatureRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

#[derive(Debug, Serialize)]
pub struct SettingsChoices {
    pub chat_models: Vec<String>,
    pub embedding_models: Vec<String>,
    pub temperature: TemperatureRange,
}

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub settings: ModelSettings,
    pub choices: SettingsChoices,
    pub indexed_file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    pub models: Vec<HealthStatus>,
}

/// Stores and indexes an upload unless the session already indexed it.
///
/// On failure the session keeps its previous file and engine.
#[instrument(skip_all, fields(file = %file_name, bytes = bytes.len()))]
pub async fn upload(
    state: &AppState,
    session: &SharedSession,
    file_name: &str,
    bytes: Vec<u8>,
) -> AppResult<UploadOutcome> {
    if !is_pdf_file_name(file_name) {
        return Err(AppError::UnsupportedFileType(file_name.to_string()));
    }
    if bytes.is_empty() {
        return Err(AppError::BadRequest("The uploaded file is empty.".into()));
    }
    if bytes.len() > state.config.max_upload_bytes {
        return Err(AppError::PayloadTooLarge {
            limit: state.config.max_upload_bytes,
        });
    }

    let mut s = session.lock().await;
    let digest = fingerprint(&bytes);
    if !s.needs_reindex(file_name, &digest, state.config.reindex_policy) {
        info!(policy = %state.config.reindex_policy, "upload unchanged; index kept");
        return Ok(UploadOutcome {
            file_name: file_name.to_string(),
            indexed: false,
            message: format!("Already indexed: {file_name}"),
        });
    }

    let settings = s.settings().clone();
    let index = {
        // the store stays locked until the loader has read the file
        let staged = state.uploads.stage(bytes).await?;
        let res = state
            .pipeline
            .index_dir(state.uploads.data_dir(), &settings.embed_model)
            .await;
        drop(staged);
        res?
    };

    info!(
        nodes = index.len(),
        dim = index.dim(),
        embed_model = index.embed_model(),
        "upload indexed"
    );
    let engine = state.pipeline.query_engine(Arc::new(index), &settings);
    s.accept_upload(
        IndexedFile {
            name: file_name.to_string(),
            fingerprint: digest,
        },
        engine,
    );

    Ok(UploadOutcome {
        file_name: file_name.to_string(),
        indexed: true,
        message: format!("Indexed: {file_name}"),
    })
}

/// Records the question and answers it, or warns when nothing is indexed.
#[instrument(skip_all)]
pub async fn ask(
    state: &AppState,
    session: &SharedSession,
    question: &str,
    prog: &dyn Progress,
) -> AppResult<AskOutcome> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("question must not be empty".into()));
    }

    let mut s = session.lock().await;
    s.push_turn(Role::User, question);

    let Some(engine) = s.engine().cloned() else {
        info!("question before any upload");
        return Ok(AskOutcome {
            kind: AnswerKind::Warning,
            message: NO_DOCUMENT_WARNING.to_string(),
            sources: Vec::new(),
        });
    };

    let resp = engine.query_with_progress(question, prog).await?;
    let answer = resp.answer_text();
    s.push_turn(Role::Assistant, answer.clone());

    let sessions = state.sessions.count().await;
    info!(
        sessions,
        sources = resp.source_nodes.len(),
        "answer recorded"
    );
    Ok(AskOutcome {
        kind: AnswerKind::Answer,
        message: answer,
        sources: resp.source_nodes,
    })
}

/// Current settings plus the allowed choices.
pub async fn settings_view(state: &AppState, session: &SharedSession) -> SettingsView {
    let s = session.lock().await;
    let catalog = state.catalog();
    SettingsView {
        settings: s.settings().clone(),
        choices: SettingsChoices {
            chat_models: catalog.chat_models.clone(),
            embedding_models: catalog.embedding_models.clone(),
            temperature: TemperatureRange {
                min: MIN_TEMPERATURE,
                max: MAX_TEMPERATURE,
                step: TEMPERATURE_STEP,
            },
        },
        indexed_file: s.last_file().map(|f| f.name.clone()),
    }
}

/// Validates and applies `patch`.
///
/// A new embedding model drops the index (vectors are not comparable across
/// models). A new chat model or temperature rebuilds the engine over the
/// existing index.
#[instrument(skip_all)]
pub async fn update_settings(
    state: &AppState,
    session: &SharedSession,
    patch: SettingsPatch,
) -> AppResult<ModelSettings> {
    let catalog = state.catalog();
    let mut s = session.lock().await;
    let prev = s.settings().clone();
    let mut next = prev.clone();

    if let Some(model) = patch.chat_model {
        catalog.check_chat_model(&model)?;
        next.chat_model = model;
    }
    if let Some(t) = patch.temperature {
        validate_temperature(t)?;
        next.temperature = snap_temperature(t);
    }
    if let Some(model) = patch.embed_model {
        catalog.check_embedding_model(&model)?;
        next.embed_model = model;
    }

    if next == prev {
        return Ok(next);
    }

    if next.embed_model != prev.embed_model {
        info!(from = %prev.embed_model, to = %next.embed_model, "embedding model changed; index dropped");
        s.invalidate_index();
    } else if let Some(index) = s.engine().map(|e| e.index().clone()) {
        info!(chat_model = %next.chat_model, temperature = next.temperature, "query engine rebuilt");
        let engine = state.pipeline.query_engine(index, &next);
        s.replace_engine(engine);
    }

    s.set_settings(next.clone());
    Ok(next)
}

pub async fn transcript(session: &SharedSession) -> Vec<ChatTurn> {
    session.lock().await.transcript().to_vec()
}

pub async fn clear_chat(session: &SharedSession) {
    session.lock().await.clear_chat();
}

/// Checks the runtime for the session's chat and embedding models.
pub async fn health(state: &AppState, session: &SharedSession) -> HealthReport {
    let settings = session.lock().await.settings().clone();
    health_for(state, &settings).await
}

/// Checks the runtime for the models new sessions start with.
pub async fn default_health(state: &AppState) -> HealthReport {
    health_for(state, state.sessions.defaults()).await
}

async fn health_for(state: &AppState, settings: &ModelSettings) -> HealthReport {
    let catalog = state.catalog();
    let configs = [
        catalog.chat_config(&settings.chat_model, settings.temperature),
        catalog.embedding_config(&settings.embed_model),
    ];
    let models = state.llm.health(&configs).await;
    HealthReport {
        ok: models.iter().all(|m| m.ok),
        models,
    }
}

fn snap_temperature(t: f32) -> f32 {
    let steps = (t / TEMPERATURE_STEP).round();
    (steps * TEMPERATURE_STEP * 100.0).round() / 100.0
}
