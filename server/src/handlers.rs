use askama::Template;
use axum::Form;
use axum::extract::Multipart;
use axum::extract::State;
use axum::response::Html;
use axum::response::Redirect;
use serde::Deserialize;
use triage_utils_string::decode_text;

use crate::AppState;
use crate::error::Result;
use crate::page::IndexPage;
use crate::page::NO_FILE_NOTICE;
use crate::page::ResultView;

/// Multipart field carrying the email file.
pub const UPLOAD_FIELD: &str = "arquivo";

pub async fn index() -> Result<Html<String>> {
    Ok(Html(IndexPage::empty().render()?))
}

/// A file taken from the upload form.
#[derive(Debug)]
struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Html<String>> {
    let Some(upload) = read_upload(&mut multipart).await? else {
        tracing::info!("upload submitted without a file");
        return Ok(Html(IndexPage::notice(NO_FILE_NOTICE).render()?));
    };

    tokio::fs::create_dir_all(&state.upload_dir).await?;
    let path = state.upload_dir.join(&upload.file_name);
    tokio::fs::write(&path, &upload.bytes).await?;

    let (message, encoding) = decode_text(&upload.bytes);
    tracing::info!(
        path = %path.display(),
        bytes = upload.bytes.len(),
        ?encoding,
        "processing uploaded email"
    );

    let outcome = state.processor.process(&message).await;
    tracing::info!(
        classification = %outcome.classification,
        fallback_used = outcome.debug.fallback_used,
        "email classified"
    );

    let view = ResultView::new(message, &outcome, state.show_debug)?;
    Ok(Html(IndexPage::with_result(view).render()?))
}

/// First `arquivo` field with a usable file name. Other fields are skipped.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().and_then(safe_file_name) else {
            return Ok(None);
        };
        let bytes = field.bytes().await?.to_vec();
        return Ok(Some(Upload { file_name, bytes }));
    }
    Ok(None)
}

/// Final path component of a client-supplied file name, or `None` when
/// nothing usable is left.
pub fn safe_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    match base {
        "" | "." | ".." => None,
        _ => Some(base.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    #[serde(default)]
    pub resposta: String,
}

/// Simulated reply delivery: the text is only logged.
pub async fn send_reply(Form(form): Form<ReplyForm>) -> Redirect {
    tracing::info!(resposta = %form.resposta, "[simulated] reply sent");
    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_name_keeps_last_component() {
        assert_eq!(safe_file_name("email.txt").as_deref(), Some("email.txt"));
        assert_eq!(safe_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(safe_file_name("C:\\Users\\ana\\msg.txt").as_deref(), Some("msg.txt"));
    }

    #[test]
    fn unusable_file_names_are_rejected() {
        assert_eq!(safe_file_name(""), None);
        assert_eq!(safe_file_name("dir/"), None);
        assert_eq!(safe_file_name(".."), None);
        assert_eq!(safe_file_name("  "), None);
    }
}
