    use super::*;
    use crate::job::{Job, JobContext};
    use crate::error::JobError;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    struct NoopJob;

    #[async_trait::async_trait]
    impl Job for NoopJob {
        async fn execute(&self, _ctx: &JobContext, _cancel: &CancellationToken) -> Result<(), JobError> {
            Ok(())
        }
    }

    fn complete() -> JobBuilder {
        JobBuilder::create()
            .with_id("job1")
            .with_job_type("noop")
            .with_policy(RetryPolicy::default())
    }

    #[test]
    fn test_build_requires_id() {
        let result = JobBuilder::create()
            .with_job_type("noop")
            .with_policy(RetryPolicy::default())
            .build();
        assert_eq!(result.unwrap_err(), ValidationError::MissingId);

        let result = complete().with_id("   ").build();
        assert_eq!(result.unwrap_err(), ValidationError::MissingId);
    }

    #[test]
    fn test_build_requires_job_type() {
        let result = JobBuilder::create()
            .with_id("job1")
            .with_policy(RetryPolicy::default())
            .build();
        assert_eq!(result.unwrap_err(), ValidationError::MissingJobType);
    }

    #[test]
    fn test_build_requires_policy() {
        let result = JobBuilder::create()
            .with_id("job1")
            .with_job_type("noop")
            .build();
        assert_eq!(result.unwrap_err(), ValidationError::MissingPolicy);
    }

    #[test]
    fn test_one_time_descriptor() {
        let descriptor = complete().build().unwrap();
        assert_eq!(descriptor.id(), "job1");
        assert_eq!(descriptor.job_type().as_str(), "noop");
        assert!(!descriptor.is_recurring());
        assert_eq!(descriptor.recurrence_interval(), None);
        assert_eq!(descriptor.next_delay(), Duration::ZERO);
        assert!(descriptor.metadata().is_none());
    }

    #[test]
    fn test_recurring_descriptor() {
        let descriptor = complete()
            .recurring_every(Duration::from_millis(750))
            .build()
            .unwrap();
        assert!(descriptor.is_recurring());
        assert_eq!(descriptor.next_delay(), Duration::from_millis(750));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = complete().recurring_every(Duration::ZERO).build();
        assert_eq!(result.unwrap_err(), ValidationError::InvalidInterval);
    }

    #[test]
    fn test_interval_helpers() {
        let cases = [
            (complete().every_seconds(30), Duration::from_secs(30)),
            (complete().every_minutes(2), Duration::from_secs(120)),
            (complete().every_hours(1), Duration::from_secs(3_600)),
            (complete().every_days(1), Duration::from_secs(86_400)),
            (complete().every_weeks(1), Duration::from_secs(604_800)),
            (complete().every_months(1), Duration::from_secs(30 * 86_400)),
            (complete().every_years(1), Duration::from_secs(365 * 86_400)),
        ];
        for (builder, expected) in cases {
            assert_eq!(builder.build().unwrap().next_delay(), expected);
        }
    }

    #[test]
    fn test_huge_intervals_saturate() {
        let max = Duration::from_secs(u64::MAX);
        let cases = [
            complete().every_minutes(u64::MAX),
            complete().every_days(u64::MAX / 1_000),
            complete().every_weeks(u64::MAX / 7),
            complete().every_years(u64::MAX),
        ];
        for builder in cases {
            assert_eq!(builder.build().unwrap().next_delay(), max);
        }
    }

    #[test]
    fn test_with_job_uses_type_name() {
        let descriptor = JobBuilder::create()
            .with_id("typed")
            .with_job::<NoopJob>()
            .with_policy(RetryPolicy::default())
            .build()
            .unwrap();
        assert_eq!(descriptor.job_type(), &JobType::of::<NoopJob>());
        assert!(descriptor.job_type().as_str().ends_with("NoopJob"));
    }

    #[test]
    fn test_metadata() {
        let descriptor = complete()
            .with_metadata_entry("owner", "ops")
            .with_metadata_entry("priority", 3)
            .build()
            .unwrap();
        let metadata = descriptor.metadata().unwrap();
        assert_eq!(metadata.get("owner"), Some(&json!("ops")));
        assert_eq!(metadata.get("priority"), Some(&json!(3)));
    }

    #[test]
    fn test_simple_retry_helper() {
        let descriptor = JobBuilder::create()
            .with_id("retry")
            .with_job_type("noop")
            .with_simple_retry(4, Duration::from_secs(1))
            .build()
            .unwrap();
        assert!(format!("{:?}", descriptor.policy()).contains("RetryPolicy"));
    }

    #[test]
    fn test_simple_retry_helper_invalid_attempts() {
        let result = JobBuilder::create()
            .with_id("retry")
            .with_job_type("noop")
            .with_simple_retry(0, Duration::from_secs(1))
            .build();
        assert_eq!(result.unwrap_err(), ValidationError::InvalidMaxAttempts(0));
    }

    #[test]
    fn test_retry_and_timeout_helper() {
        let descriptor = JobBuilder::create()
            .with_id("both")
            .with_job_type("noop")
            .with_retry_and_timeout(3, Duration::from_secs(1), Duration::from_secs(10))
            .build()
            .unwrap();
        let debug = format!("{:?}", descriptor.policy());
        assert!(debug.contains("CompositePolicy"));
        assert!(debug.find("RetryPolicy") < debug.find("TimeoutPolicy"));
    }

    #[test]
    fn test_retry_and_timeout_helper_invalid_timeout() {
        let result = JobBuilder::create()
            .with_id("both")
            .with_job_type("noop")
            .with_retry_and_timeout(3, Duration::from_secs(1), Duration::ZERO)
            .build();
        assert_eq!(result.unwrap_err(), ValidationError::InvalidTimeout);
    }

    #[test]
    fn test_later_policy_clears_helper_error() {
        let descriptor = JobBuilder::create()
            .with_id("fixed")
            .with_job_type("noop")
            .with_simple_retry(0, Duration::ZERO)
            .with_policy(RetryPolicy::default())
            .build();
        assert!(descriptor.is_ok());
    }

    #[tokio::test]
    async fn test_descriptor_policy_runs_job() {
        let descriptor = complete().build().unwrap();
        let ctx = JobContext::new(descriptor.id(), descriptor.shared_metadata());
        let result = descriptor
            .policy()
            .execute(&NoopJob, &ctx, &CancellationToken::new())
            .await;
        assert!(result.is_success());
    }
