//! Plain-text transcript of a finished single-lineage session.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::core::state::SessionState;

/// Sessions finishing within the same millisecond get a numeric suffix.
const MAX_SAME_STAMP: u32 = 100;

pub fn transcript_file_name(now: DateTime<Local>, copy: u32) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S_%3f");
    match copy {
        0 => format!("partida_{stamp}.txt"),
        n => format!("partida_{stamp}_{n}.txt"),
    }
}

pub fn render_transcript(state: &SessionState) -> String {
    let mystery = state.mystery();
    let mut out = String::new();
    out.push_str("=== Black Stories ===\n");
    out.push_str(&format!("Dificultad: {}\n\n", state.difficulty()));
    out.push_str(&format!("Situación misteriosa:\n{}\n\n", mystery.situation));
    out.push_str(&format!(
        "Preguntas ({}/{}):\n",
        state.questions_asked(),
        state.question_limit()
    ));
    for (idx, entry) in state.history().iter().enumerate() {
        out.push_str(&format!(
            "{}. Detective: {}\n   Narrador: {}\n",
            idx + 1,
            entry.question,
            entry.answer
        ));
    }
    if let Some(attempt) = state.attempt() {
        out.push_str(&format!("\nSolución propuesta:\n{}\n", attempt.text));
    }
    if let Some(verdict) = state.verdict() {
        out.push_str(&format!(
            "\nResultado: {}\nVeredicto: {}\nAnálisis: {}\n",
            verdict.outcome.result_label(),
            verdict.outcome.label(),
            verdict.rationale
        ));
    }
    out.push_str(&format!("\nSolución real:\n{}\n", mystery.hidden_solution));
    out
}

pub fn write_transcript(dir: &Path, state: &SessionState, now: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;
    let (path, mut file) = create_unique(dir, now)?;
    file.write_all(render_transcript(state).as_bytes())
        .with_context(|| format!("write transcript {}", path.display()))?;
    Ok(path)
}

/// Never truncates: an existing name moves on to the next suffix.
fn create_unique(dir: &Path, now: DateTime<Local>) -> Result<(PathBuf, File)> {
    for copy in 0..MAX_SAME_STAMP {
        let path = dir.join(transcript_file_name(now, copy));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(err).with_context(|| format!("create transcript {}", path.display()));
            }
        }
    }
    anyhow::bail!(
        "{MAX_SAME_STAMP} transcripts already share timestamp {}",
        now.format("%Y%m%d_%H%M%S_%3f")
    )
}

/// Write a transcript when `dir` is configured. Failures are logged, never fatal.
pub fn save_transcript(dir: Option<&Path>, state: &SessionState) -> Option<PathBuf> {
    let dir = dir?;
    match write_transcript(dir, state, Local::now()) {
        Ok(path) => {
            info!(path = %path.display(), "transcript written");
            Some(path)
        }
        Err(err) => {
            warn!(error = %err, "failed to write transcript");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::difficulty::Difficulty;
    use crate::core::types::{AnswerToken, Mystery, Outcome, Seat, Verdict};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn finished_state() -> SessionState {
        let mystery = Arc::new(Mystery {
            situation: "Un hombre muerto en un campo.".to_string(),
            hidden_solution: "Su paracaídas no se abrió.".to_string(),
        });
        let mut state = SessionState::new(Seat::First, mystery, Difficulty::Easy, 20);
        state.record_answer("¿Cayó?", AnswerToken::Yes).expect("answer");
        state.record_solution("Paracaídas", false).expect("solution");
        state
            .record_verdict(Verdict {
                outcome: Outcome::Correct,
                rationale: "Exacto".to_string(),
            })
            .expect("verdict");
        state
    }

    #[test]
    fn file_name_uses_timestamp() {
        let now = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("valid local time");
        assert_eq!(transcript_file_name(now, 0), "partida_20240309_070501_000.txt");
        assert_eq!(transcript_file_name(now, 2), "partida_20240309_070501_000_2.txt");
    }

    #[test]
    fn same_timestamp_never_overwrites() {
        let temp = tempfile::tempdir().expect("tempdir");
        let now = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("valid local time");
        let first = write_transcript(temp.path(), &finished_state(), now).expect("first");
        let second = write_transcript(temp.path(), &finished_state(), now).expect("second");

        assert_ne!(first, second);
        assert_eq!(fs::read_dir(temp.path()).expect("read dir").count(), 2);
        assert_eq!(
            fs::read_to_string(&first).expect("read"),
            fs::read_to_string(&second).expect("read")
        );
    }

    #[test]
    fn transcript_lists_history_and_outcome() {
        let text = render_transcript(&finished_state());
        assert!(text.contains("Dificultad: facil"));
        assert!(text.contains("1. Detective: ¿Cayó?\n   Narrador: sí"));
        assert!(text.contains("Resultado: VICTORIA"));
        assert!(text.contains("Su paracaídas no se abrió."));
    }

    #[test]
    fn writes_into_configured_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("partidas");
        let path = save_transcript(Some(&dir), &finished_state()).expect("written");
        assert!(path.starts_with(&dir));
        let contents = fs::read_to_string(path).expect("read");
        assert!(contents.contains("Paracaídas"));
    }

    #[test]
    fn unwritable_directory_is_not_fatal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "file, not a dir").expect("write");
        assert_eq!(save_transcript(Some(&blocker), &finished_state()), None);
        assert_eq!(save_transcript(None, &finished_state()), None);
    }
}
