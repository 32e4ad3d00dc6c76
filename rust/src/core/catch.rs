// File: core/catch.rs
// Turns a failing call into a value instead of letting the failure escape.
//
// Both `Err` returns and panics are absorbed. The `exception` field tells
// them apart so callers can still single out programming errors.

use futures::FutureExt;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::any::Any;
use std::fmt::{self, Display};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

pub const ERROR_STATUS: &str = "error";
pub const OK_STATUS: &str = "ok";

/// What went wrong inside a wrapped call.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure<E> {
    /// The call returned `Err`.
    Raised(E),
    /// The call panicked; holds the panic message.
    Panicked(String),
}

impl<E: Display> Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Raised(e) => write!(f, "{}", e),
            Failure::Panicked(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResult<E> {
    pub status: &'static str,
    pub error: String,
    pub exception: Failure<E>,
}

impl<E: Display> ErrorResult<E> {
    pub fn new(exception: Failure<E>) -> Self {
        Self {
            status: ERROR_STATUS,
            error: exception.to_string(),
            exception,
        }
    }
}

// `exception` is not serializable in general; the wire shape carries status and error.
impl<E> Serialize for ErrorResult<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ErrorResult", 2)?;
        state.serialize_field("status", self.status)?;
        state.serialize_field("error", &self.error)?;
        state.end()
    }
}

/// Result of a wrapped call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T, E> {
    Ok(T),
    Error(ErrorResult<E>),
}

impl<T, E> Outcome<T, E> {
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Ok(_) => OK_STATUS,
            Outcome::Error(e) => e.status,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(self) -> Option<ErrorResult<E>> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Error(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<T, ErrorResult<E>> {
        match self {
            Outcome::Ok(v) => Ok(v),
            Outcome::Error(e) => Err(e),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn settle<T, E: Display>(result: Result<Result<T, E>, Box<dyn Any + Send>>) -> Outcome<T, E> {
    let failure = match result {
        Ok(Ok(value)) => return Outcome::Ok(value),
        Ok(Err(e)) => Failure::Raised(e),
        Err(payload) => Failure::Panicked(panic_message(payload)),
    };
    let error = ErrorResult::new(failure);
    log::debug!("Caught failure: {}", error.error);
    Outcome::Error(error)
}

/// Runs `f` once, absorbing any failure.
pub fn catch<T, E, F>(f: F) -> Outcome<T, E>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    settle(panic::catch_unwind(AssertUnwindSafe(f)))
}

/// Awaits `future`, absorbing any failure.
pub async fn catch_async<T, E, Fut>(future: Fut) -> Outcome<T, E>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
{
    settle(AssertUnwindSafe(future).catch_unwind().await)
}

/// A named function whose calls never fail outward.
pub struct Catch<F> {
    name: &'static str,
    f: F,
}

impl<F> Catch<F> {
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    /// Wraps `f` under its own item name (`divide` for `crate::ops::divide`).
    /// Closures come out as `{{closure}}`.
    pub fn from_fn(f: F) -> Self {
        let path = std::any::type_name::<F>();
        let name = path.rsplit("::").next().unwrap_or(path);
        Self { name, f }
    }

    /// Name of the wrapped function.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call<A, T, E>(&self, args: A) -> Outcome<T, E>
    where
        F: Fn(A) -> Result<T, E>,
        E: Display,
    {
        catch(|| (self.f)(args))
    }
}

impl<F> fmt::Debug for Catch<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catch").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CoreError;

    fn divide((a, b): (i32, i32)) -> Result<i32, String> {
        if b == 0 {
            Err("division by zero".to_string())
        } else {
            Ok(a / b)
        }
    }

    #[test]
    fn test_success_passes_through() {
        assert_eq!(catch(|| Ok::<_, String>(42)), Outcome::Ok(42));
        assert_eq!(catch(|| Ok::<_, String>(())), Outcome::Ok(()));
        assert_eq!(catch(|| Ok::<Option<i32>, String>(None)), Outcome::Ok(None));
        assert_eq!(catch(|| Ok::<_, String>(42)).status(), "ok");
    }

    #[test]
    fn test_error_becomes_error_result() {
        let outcome = catch(|| url::Url::parse("no scheme").map_err(CoreError::from));
        let error = outcome.error().unwrap();
        assert_eq!(error.status, "error");
        assert_eq!(error.error, "Failed to parse URL: relative URL without a base");
        assert!(matches!(error.exception, Failure::Raised(CoreError::UrlParse(_))));
    }

    #[test]
    fn test_panic_is_absorbed() {
        let outcome: Outcome<i32, String> = catch(|| {
            let items: Vec<i32> = Vec::new();
            Ok(items[3])
        });
        let error = outcome.error().unwrap();
        assert_eq!(error.status, ERROR_STATUS);
        assert!(error.error.contains("index out of bounds"));
        assert!(matches!(error.exception, Failure::Panicked(_)));
    }

    #[test]
    fn test_panic_with_static_message() {
        let outcome: Outcome<(), String> = catch(|| panic!("boom"));
        assert_eq!(outcome.error().unwrap().exception, Failure::Panicked("boom".into()));
    }

    #[test]
    fn test_named_wrapper() {
        let wrapped = Catch::new("divide", divide);
        assert_eq!(wrapped.name(), "divide");
        assert_eq!(wrapped.call((10, 2)), Outcome::Ok(5));

        let outcome = wrapped.call((1, 0));
        assert!(outcome.is_error());
        let error = outcome.into_result().unwrap_err();
        assert_eq!(error.error, "division by zero");
        assert_eq!(error.exception, Failure::Raised("division by zero".to_string()));
    }

    #[test]
    fn test_named_from_fn_item() {
        let wrapped = Catch::from_fn(divide);
        assert_eq!(wrapped.name(), "divide");
        assert_eq!(wrapped.call((9, 3)), Outcome::Ok(3));
        assert!(wrapped.call((9, 0)).is_error());

        let closure = Catch::from_fn(|x: i32| Ok::<_, String>(x + 1));
        assert_eq!(closure.name(), "{{closure}}");
        assert_eq!(closure.call(1), Outcome::Ok(2));
    }

    #[test]
    fn test_error_result_serializes_status_and_error() {
        let error = ErrorResult::new(Failure::Raised("bad input".to_string()));
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({"status": "error", "error": "bad input"})
        );
    }

    #[tokio::test]
    async fn test_catch_async() {
        let ok = catch_async(async { Ok::<_, String>("done") }).await;
        assert_eq!(ok, Outcome::Ok("done"));

        let failed: Outcome<(), String> = catch_async(async { Err("late".to_string()) }).await;
        assert_eq!(failed.status(), "error");

        let panicked: Outcome<(), String> = catch_async(async {
            if true {
                panic!("async boom");
            }
            Ok(())
        })
        .await;
        assert_eq!(
            panicked.error().unwrap().exception,
            Failure::Panicked("async boom".to_string())
        );
    }
}
