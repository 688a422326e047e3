use jobq_store::{JobValidationError, NewJob, DEFAULT_PRIORITY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const JOB_CREATED_MESSAGE: &str = "Job created successfully";

/// Raw body of `POST /jobs`.
///
/// Every field is kept as an untyped JSON value so a wrongly typed field is
/// reported the same way as a missing one.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitJobDto {
    #[serde(default)]
    pub queue_name: Option<Value>,
    #[serde(default)]
    pub job_type: Option<Value>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub job_priority: Option<Value>,
}

impl SubmitJobDto {
    /// Read the submission out of an arbitrary JSON body.
    ///
    /// Anything that is not an object carries no fields at all.
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(_) => serde_json::from_value(body).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    pub fn into_new_job(self) -> Result<NewJob, JobValidationError> {
        let queue_name = string_field(self.queue_name);
        let job_type = string_field(self.job_type);
        let payload = self.payload.unwrap_or(Value::Null);

        let job = NewJob::new(queue_name, job_type, payload)?;
        Ok(job.with_priority(parse_priority(self.job_priority)?))
    }
}

fn string_field(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Absent and falsy values (`null`, `false`, `0`, `""`) all mean "use the
/// default". Numbers must be integral and fit in an `i32`; `5.0` is 5.
fn parse_priority(value: Option<Value>) -> Result<i32, JobValidationError> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(DEFAULT_PRIORITY),
        Some(Value::String(s)) if s.is_empty() => Ok(DEFAULT_PRIORITY),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(n) => i32::try_from(n).map_err(|_| JobValidationError::InvalidPriority),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .filter(|f| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(f))
                .map(|f| f as i32)
                .ok_or(JobValidationError::InvalidPriority),
        },
        Some(_) => Err(JobValidationError::InvalidPriority),
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub message: &'static str,
    pub job_id: Uuid,
}

impl SubmitJobResponse {
    pub fn created(job_id: Uuid) -> Self {
        Self {
            message: JOB_CREATED_MESSAGE,
            job_id,
        }
    }
}
