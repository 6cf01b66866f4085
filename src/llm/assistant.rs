use std::sync::Arc;

use log::{info, warn};

use crate::assembler::Row;
use crate::llm::client::ChatBackend;
use crate::llm::prompts::{self, INSIGHTS_TITLE, NEGATIVE_VALUES_TITLE};
use crate::llm::types::NarrativePanel;
use crate::llm::utils::dump_rows;

/// Asks the chat model for commentary on the filtered rows.
///
/// Best-effort: every failure ends up inside the returned panels, never as an
/// error for the caller.
#[derive(Clone)]
pub struct InsightGenerator {
    backend: Result<Arc<dyn ChatBackend>, String>,
    model: String,
}

impl InsightGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend: Ok(backend),
            model: model.into(),
        }
    }

    /// A generator that never calls out, e.g. when no credential is configured.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            backend: Err(reason.into()),
            model: String::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_ok()
    }

    /// Sends both prompts as separate single-message requests, one after the other.
    pub async fn generate(&self, rows: &[Row<'_>]) -> Vec<NarrativePanel> {
        let dump = dump_rows(rows);
        let insights = self
            .ask(INSIGHTS_TITLE, &prompts::ten_insights(&dump))
            .await;
        let negatives = self
            .ask(NEGATIVE_VALUES_TITLE, &prompts::negative_values(&dump))
            .await;

        vec![insights, negatives]
    }

    async fn ask(&self, title: &'static str, prompt: &str) -> NarrativePanel {
        let backend = match &self.backend {
            Ok(backend) => backend,
            Err(reason) => return NarrativePanel::failed(title, reason.clone()),
        };

        info!("Requesting '{}' from {} ({} chars)", title, self.model, prompt.len());
        match backend.complete(&self.model, prompt).await {
            Ok(text) => NarrativePanel::text(title, text),
            Err(e) => {
                warn!("Insight '{}' failed: {}", title, e);
                NarrativePanel::failed(title, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CusteioError, Result};
    use crate::llm::types::PanelBody;
    use crate::schema::ExpenseRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Recorder {
        prompts: Mutex<Vec<String>>,
        fail_negatives: bool,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl Recorder {
        fn new(fail_negatives: bool) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail_negatives,
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for Recorder {
        async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
            assert_eq!(model, "gpt-3.5-turbo");
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_negatives && prompt.contains("valores negativos") {
                return Err(CusteioError::ChatCompletion("status 500".to_string()));
            }
            Ok(format!("resposta {}", prompt.len()))
        }
    }

    fn record() -> ExpenseRecord {
        ExpenseRecord {
            period: "202101".to_string(),
            parent_org_name: "Ministério".to_string(),
            parent_org_code: "MIN".to_string(),
            org_name: "Secretaria".to_string(),
            org_code: "SEC".to_string(),
            expense_item: "Diárias".to_string(),
            expense_nature: "Diárias civil".to_string(),
            value: -42.0,
        }
    }

    #[tokio::test]
    async fn test_two_independent_requests() {
        let recorder = Arc::new(Recorder::new(false));
        let generator = InsightGenerator::new(recorder.clone(), "gpt-3.5-turbo");
        let rec = record();
        let panels = generator.generate(&[Row { id: 0, record: &rec }]).await;

        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].title, INSIGHTS_TITLE);
        assert_eq!(panels[1].title, NEGATIVE_VALUES_TITLE);
        assert!(panels.iter().all(|p| !p.is_failed()));

        let prompts = recorder.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|p| p.contains("Diárias civil")));
        assert!(prompts[1].contains("valores negativos"));
    }

    #[tokio::test]
    async fn test_requests_are_sent_one_at_a_time() {
        let recorder = Arc::new(Recorder::new(false));
        let generator = InsightGenerator::new(recorder.clone(), "gpt-3.5-turbo");
        let rec = record();
        generator.generate(&[Row { id: 0, record: &rec }]).await;

        assert_eq!(recorder.prompts.lock().unwrap().len(), 2);
        assert_eq!(recorder.peak_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_affect_the_other() {
        let generator = InsightGenerator::new(
            Arc::new(Recorder::new(true)),
            "gpt-3.5-turbo",
        );
        let rec = record();
        let panels = generator.generate(&[Row { id: 0, record: &rec }]).await;

        assert!(!panels[0].is_failed());
        match &panels[1].body {
            PanelBody::Failed(reason) => assert!(reason.contains("status 500")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unavailable_generator_reports_reason() {
        let generator = InsightGenerator::unavailable("OPENAI_API_KEY não configurada");
        assert!(!generator.is_available());
        let panels = generator.generate(&[]).await;
        assert_eq!(panels.len(), 2);
        assert!(panels.iter().all(|p| p.body
            == PanelBody::Failed("OPENAI_API_KEY não configurada".to_string())));
    }
}
