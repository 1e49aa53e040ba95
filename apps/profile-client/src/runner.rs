//! Sample runner — replays the sample submissions against the API and
//! reports each outcome.
//!
//! Submissions are independent of each other. By default they run one after
//! another; `run_concurrent` spawns them all at once and still reports in
//! submission order.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::client::ProfileClient;
use crate::endpoint::Endpoint;
use crate::errors::ClientError;
use crate::models::{
    ChallengesRequest, Gender, GoalsRequest, JsonRequest, MeansRequest, StrengthsRequest,
};
use crate::payload::{Attachment, Payload};
use crate::response::Response;

/// Timeout for the goals and means samples.
const SAMPLE_TIMEOUT_SECS: u64 = 30;

/// Endpoint + payload + transfer mode + optional timeout, labelled for reporting.
#[derive(Debug, Clone)]
pub struct Submission {
    pub label: String,
    pub endpoint: Endpoint,
    pub payload: Payload,
    pub as_multipart: bool,
    pub timeout: Option<Duration>,
}

impl Submission {
    pub fn json<R: JsonRequest>(label: &str, request: &R) -> Result<Self, ClientError> {
        Ok(Self {
            label: label.to_string(),
            endpoint: R::ENDPOINT,
            payload: request.to_payload()?,
            as_multipart: false,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Anything that can carry a submission to the API.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn dispatch(&self, submission: &Submission) -> Result<Response, ClientError>;
}

#[async_trait]
impl Submitter for ProfileClient {
    async fn dispatch(&self, submission: &Submission) -> Result<Response, ClientError> {
        self.submit(
            submission.endpoint,
            &submission.payload,
            submission.as_multipart,
            submission.timeout,
        )
        .await
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub label: String,
    pub endpoint: Endpoint,
    pub result: Result<Response, ClientError>,
}

impl Outcome {
    pub fn is_successful(&self) -> bool {
        matches!(&self.result, Ok(r) if r.is_successful())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(response) if response.is_successful() => {
                writeln!(f, "[{}] OK ({})", self.label, response.status())?;
                match response.json() {
                    Some(json) => {
                        let pretty = serde_json::to_string_pretty(json).map_err(|_| fmt::Error)?;
                        write!(f, "{pretty}")
                    }
                    None => write!(f, "{}", response.body()),
                }
            }
            Ok(response) => write!(
                f,
                "[{}] Error ({}): {}",
                self.label,
                response.status(),
                response.error_detail()
            ),
            Err(e) => write!(f, "[{}] Failed: {e}", self.label),
        }
    }
}

/// Tally of outcomes by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    /// A response arrived with a non-2xx status.
    pub rejected: usize,
    /// No response: connection, DNS or timeout failure.
    pub transport_failures: usize,
    /// Failed before sending (bad payload, unreadable attachment) or the task died.
    pub other_errors: usize,
}

pub fn summarize(outcomes: &[Outcome]) -> Summary {
    outcomes
        .iter()
        .fold(Summary::default(), |mut summary, o| {
            match &o.result {
                Ok(r) if r.is_successful() => summary.succeeded += 1,
                Ok(_) => summary.rejected += 1,
                Err(e) if e.is_transport() => summary.transport_failures += 1,
                Err(_) => summary.other_errors += 1,
            }
            summary
        })
}

/// The five sample submissions: strengths, challenges, goals, means, full profile.
pub fn sample_submissions(
    attachment: Option<Attachment>,
    full_profile_timeout: Duration,
) -> Result<Vec<Submission>, ClientError> {
    let sample_timeout = Duration::from_secs(SAMPLE_TIMEOUT_SECS);

    let strengths = StrengthsRequest {
        age: Some(21.5),
        description: "He is good at mathematics and physics".to_string(),
    };
    let challenges = ChallengesRequest {
        age: Some(21.5),
        description: "He has trouble managing his time and feels stressed before exams."
            .to_string(),
    };
    let goals = GoalsRequest {
        age: Some(21.5),
        gender: Gender::Female,
        strengths: Some(strings(&[
            "Strong teamwork skills",
            "Excellent listening skills",
            "Creative problem-solving",
        ])),
        challenges: Some(strings(&[
            "Difficulty with time management",
            "Anxiety before exams",
        ])),
        needs: Some(vec![]),
    };
    let means = MeansRequest {
        age: Some(21.5),
        gender: Gender::Female,
        strengths: Some(strings(&["Strong teamwork skills"])),
        challenges: Some(strings(&["Difficulty with time management"])),
        needs: Some(strings(&["Personalized study plan"])),
        goals: strings(&["Develop a weekly study schedule"]),
    };
    // age goes out as the literal text "21"; the API casts form fields itself
    let mut full = Payload::new()
        .field("description", "Je decris le contenu de ce champ")
        .field("age", "21")
        .field("gender", Gender::Female.as_str());
    if let Some(file) = attachment {
        full.insert("file", file);
    }

    Ok(vec![
        Submission::json("Strengths", &strengths)?,
        Submission::json("Challenges", &challenges)?,
        Submission::json("Goals", &goals)?.with_timeout(sample_timeout),
        Submission::json("Means", &means)?.with_timeout(sample_timeout),
        Submission {
            label: "Full profile".to_string(),
            endpoint: Endpoint::FullProfile,
            payload: full,
            as_multipart: true,
            timeout: Some(full_profile_timeout),
        },
    ])
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub async fn run_sequential(submitter: &dyn Submitter, submissions: Vec<Submission>) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(submissions.len());
    for submission in submissions {
        info!("Submitting {} to {}", submission.label, submission.endpoint);
        let result = submitter.dispatch(&submission).await;
        outcomes.push(Outcome {
            label: submission.label,
            endpoint: submission.endpoint,
            result,
        });
    }
    outcomes
}

pub async fn run_concurrent(
    submitter: Arc<dyn Submitter>,
    submissions: Vec<Submission>,
) -> Vec<Outcome> {
    let handles: Vec<_> = submissions
        .into_iter()
        .map(|submission| {
            let submitter = Arc::clone(&submitter);
            info!("Submitting {} to {}", submission.label, submission.endpoint);
            let label = submission.label.clone();
            let endpoint = submission.endpoint;
            let handle =
                tokio::spawn(async move { submitter.dispatch(&submission).await });
            (label, endpoint, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (label, endpoint, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!("{label} submission task did not complete: {e}");
                Err(ClientError::TaskFailed(e.to_string()))
            }
        };
        outcomes.push(Outcome {
            label,
            endpoint,
            result,
        });
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{FieldValue, FormPart};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Answers each endpoint with a canned status/body and records call order.
    struct FakeSubmitter {
        calls: Mutex<Vec<Endpoint>>,
        delay_first: Option<Duration>,
    }

    impl FakeSubmitter {
        fn new() -> Self {
            Self {
                calls: Mutex::new(vec![]),
                delay_first: None,
            }
        }
    }

    #[async_trait]
    impl Submitter for FakeSubmitter {
        async fn dispatch(&self, submission: &Submission) -> Result<Response, ClientError> {
            if submission.endpoint == Endpoint::Strengths {
                if let Some(delay) = self.delay_first {
                    tokio::time::sleep(delay).await;
                }
            }
            self.calls.lock().unwrap().push(submission.endpoint);
            let (status, body) = match submission.endpoint {
                Endpoint::Goals => (422, r#"{"detail":"age required"}"#),
                _ => (200, r#"{"data":[],"error":false,"message":null}"#),
            };
            Ok(Response::new(status, BTreeMap::new(), body.to_string()))
        }
    }

    fn samples() -> Vec<Submission> {
        sample_submissions(None, Duration::from_secs(120)).unwrap()
    }

    #[test]
    fn test_sample_endpoints_in_order() {
        let endpoints: Vec<_> = samples().iter().map(|s| s.endpoint).collect();
        assert_eq!(endpoints, Endpoint::ALL.to_vec());
    }

    #[test]
    fn test_sample_goals_payload() {
        let goals = &samples()[2];
        assert!(!goals.as_multipart);
        assert_eq!(goals.timeout, Some(Duration::from_secs(30)));
        assert_eq!(
            goals.payload.to_json().unwrap(),
            json!({
                "age": 21.5,
                "challenges": ["Difficulty with time management", "Anxiety before exams"],
                "gender": "female",
                "needs": [],
                "strengths": [
                    "Strong teamwork skills",
                    "Excellent listening skills",
                    "Creative problem-solving"
                ]
            })
        );
    }

    #[test]
    fn test_sample_full_profile_parts() {
        let full = &samples()[4];
        assert!(full.as_multipart);
        let parts = full.payload.form_parts().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[1],
            FormPart::Text {
                name: "age".to_string(),
                value: "21".to_string()
            }
        );

        let with_file = sample_submissions(
            Some(Attachment::new("photo.png", vec![1u8])),
            Duration::from_secs(120),
        )
        .unwrap();
        assert!(matches!(
            with_file[4].payload.get("file"),
            Some(FieldValue::File(_))
        ));
    }

    #[tokio::test]
    async fn test_run_sequential_reports_each_outcome() {
        let fake = FakeSubmitter::new();
        let outcomes = run_sequential(&fake, samples()).await;

        assert_eq!(outcomes.len(), 5);
        assert_eq!(*fake.calls.lock().unwrap(), Endpoint::ALL.to_vec());
        assert_eq!(
            summarize(&outcomes),
            Summary {
                succeeded: 4,
                rejected: 1,
                ..Summary::default()
            }
        );

        let goals = &outcomes[2];
        assert!(!goals.is_successful());
        assert_eq!(goals.to_string(), "[Goals] Error (422): age required");
        assert!(outcomes[0].to_string().starts_with("[Strengths] OK (200)\n"));
    }

    #[tokio::test]
    async fn test_run_concurrent_keeps_submission_order() {
        let fake = Arc::new(FakeSubmitter {
            calls: Mutex::new(vec![]),
            delay_first: Some(Duration::from_millis(50)),
        });
        let outcomes = run_concurrent(fake.clone(), samples()).await;

        let reported: Vec<_> = outcomes.iter().map(|o| o.endpoint).collect();
        assert_eq!(reported, Endpoint::ALL.to_vec());
        // the delayed strengths call finished last
        assert_eq!(fake.calls.lock().unwrap().last(), Some(&Endpoint::Strengths));
    }

    #[test]
    fn test_payload_error_display() {
        let outcome = Outcome {
            label: "Means".to_string(),
            endpoint: Endpoint::Means,
            result: Err(ClientError::InvalidPayload {
                field: "age".to_string(),
                reason: "number must be finite".to_string(),
            }),
        };
        assert!(!outcome.is_successful());
        assert_eq!(
            outcome.to_string(),
            "[Means] Failed: Invalid payload field 'age': number must be finite"
        );
        assert_eq!(
            summarize(&[outcome]),
            Summary {
                other_errors: 1,
                ..Summary::default()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_api_counts_as_transport_failure() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = ProfileClient::new(format!("http://127.0.0.1:{port}/api/v1")).unwrap();
        let submissions = samples().into_iter().take(1).collect();

        let outcomes = run_sequential(&client, submissions).await;

        assert_eq!(
            summarize(&outcomes),
            Summary {
                transport_failures: 1,
                ..Summary::default()
            }
        );
    }

    /// Panics on the goals submission, answers everything else with 200.
    struct PanickingSubmitter;

    #[async_trait]
    impl Submitter for PanickingSubmitter {
        async fn dispatch(&self, submission: &Submission) -> Result<Response, ClientError> {
            if submission.endpoint == Endpoint::Goals {
                panic!("goals submitter blew up");
            }
            Ok(Response::new(200, BTreeMap::new(), "{}".to_string()))
        }
    }

    #[tokio::test]
    async fn test_run_concurrent_reports_failed_task() {
        let outcomes = run_concurrent(Arc::new(PanickingSubmitter), samples()).await;

        let reported: Vec<_> = outcomes.iter().map(|o| o.endpoint).collect();
        assert_eq!(reported, Endpoint::ALL.to_vec());

        let goals = &outcomes[2];
        assert_eq!(goals.label, "Goals");
        assert!(matches!(goals.result, Err(ClientError::TaskFailed(_))));
        assert_eq!(
            summarize(&outcomes),
            Summary {
                succeeded: 4,
                other_errors: 1,
                ..Summary::default()
            }
        );
    }

    #[tokio::test]
    async fn test_samples_against_mock_api() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": false})))
            .expect(5)
            .mount(&server)
            .await;

        let client = ProfileClient::new(format!("{}/api/v1", server.uri())).unwrap();
        let outcomes = run_sequential(&client, samples()).await;
        assert!(outcomes.iter().all(Outcome::is_successful));

        let paths: Vec<_> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/api/v1/strengths/",
                "/api/v1/challenges/",
                "/api/v1/goals/",
                "/api/v1/means/",
                "/api/v1/profile/full/",
            ]
        );
    }
}
