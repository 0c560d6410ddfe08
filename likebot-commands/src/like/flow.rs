use tracing::{info, warn};

use super::args::{LikeTarget, MissingInput, resolve_like_args};
use likebot_api::{LikeError, LikeOutcome};
use likebot_core::{Data, Error};
use likebot_store::{EffectiveLimit, QuotaGuard};

/// One `like` invocation reduced to plain ids.
#[derive(Clone, Debug)]
pub struct LikeRequest {
    pub user_id: u64,
    pub role_ids: Vec<u64>,
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    /// The channel allow-list only applies to prefix invocations.
    pub via_prefix: bool,
    pub region: Option<String>,
    pub uid: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Rejection {
    MissingInput(MissingInput),
    ChannelNotAllowed,
    DailyLimitReached { limit: u32 },
}

/// A request that passed every gate. Holds the user's quota lock until it is
/// dispatched.
#[derive(Debug)]
pub struct AdmittedLike {
    pub target: LikeTarget,
    pub user_id: u64,
    pub limit: EffectiveLimit,
    quota_guard: QuotaGuard,
}

#[derive(Debug)]
pub enum Admission {
    Rejected(Rejection),
    Admitted(AdmittedLike),
}

#[derive(Debug)]
pub enum LikeDecision {
    Unavailable(LikeError),
    Completed {
        outcome: LikeOutcome,
        limit: EffectiveLimit,
        remaining: Option<u32>,
    },
}

/// Run the argument check, the channel gate and the quota gate, in that order.
pub async fn admit_like(data: &Data, request: LikeRequest) -> Result<Admission, Error> {
    let target = match resolve_like_args(request.region, request.uid) {
        Ok(target) => target,
        Err(missing) => return Ok(Admission::Rejected(Rejection::MissingInput(missing))),
    };

    if request.via_prefix
        && let Some(guild_id) = request.guild_id
        && !data
            .config
            .is_channel_allowed(guild_id, request.channel_id)
            .await
    {
        return Ok(Admission::Rejected(Rejection::ChannelNotAllowed));
    }

    let user_id = request.user_id;
    let quota_guard = data.quota.lock_user(user_id).await;

    let limit = data.policy.effective_limit(user_id, &request.role_ids);
    if let EffectiveLimit::Daily(max) = limit
        && !data.quota.is_within_limit(user_id, limit).await?
    {
        info!(user_id, limit = max, "like request rejected: daily limit reached");
        return Ok(Admission::Rejected(Rejection::DailyLimitReached { limit: max }));
    }

    Ok(Admission::Admitted(AdmittedLike {
        target,
        user_id,
        limit,
        quota_guard,
    }))
}

/// Send the request and count it against the user only when it succeeded.
pub async fn dispatch_like(data: &Data, admitted: AdmittedLike) -> Result<LikeDecision, Error> {
    let AdmittedLike {
        target,
        user_id,
        limit,
        quota_guard,
    } = admitted;

    let outcome = match data.likes.send_like(&target.uid, &target.region).await {
        Ok(outcome) => outcome,
        Err(source) => {
            warn!(?source, uid = %target.uid, region = %target.region, "like service unavailable");
            return Ok(LikeDecision::Unavailable(source));
        }
    };

    if outcome.is_success() {
        data.quota.record_usage(user_id).await?;
    }
    let remaining = data.quota.remaining(user_id, limit).await?;
    drop(quota_guard);

    info!(
        user_id,
        uid = %target.uid,
        region = %target.region,
        success = outcome.is_success(),
        "like request completed"
    );

    Ok(LikeDecision::Completed {
        outcome,
        limit,
        remaining,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use likebot_api::{LikeClient, LikeError, LikeOutcome};
    use likebot_core::{Data, LikeSettings};
    use likebot_store::{ConfigStore, EffectiveLimit, QuotaPolicy, QuotaTracker};

    use super::{
        Admission, AdmittedLike, LikeDecision, LikeRequest, Rejection, admit_like, dispatch_like,
    };
    use crate::like::args::MissingInput;

    const GUILD: u64 = 100;
    const ALLOWED_CHANNEL: u64 = 1;
    const OTHER_CHANNEL: u64 = 2;
    const UNLIMITED_USER: u64 = 99;

    /// Serve one canned HTTP response.
    async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/like", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0_u8; 1024];
            while !head.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = socket.read(&mut buf).await.unwrap();
                if read == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..read]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        (url, handle)
    }

    async fn test_data(dir: &TempDir, like_url: &str) -> Data {
        let config = ConfigStore::load(dir.path().join("like_channels.json"))
            .await
            .unwrap();
        config.toggle_channel(GUILD, ALLOWED_CHANNEL).await.unwrap();

        Data {
            config,
            quota: QuotaTracker::in_memory(),
            policy: QuotaPolicy::new(1).with_unlimited_users([UNLIMITED_USER]),
            likes: LikeClient::new(like_url, "GREAT", None).unwrap(),
            settings: LikeSettings::default(),
        }
    }

    fn request(user_id: u64, channel_id: u64, via_prefix: bool) -> LikeRequest {
        LikeRequest {
            user_id,
            role_ids: Vec::new(),
            guild_id: Some(GUILD),
            channel_id,
            via_prefix,
            region: Some("br".to_owned()),
            uid: Some("123456".to_owned()),
        }
    }

    async fn expect_admitted(data: &Data, request: LikeRequest) -> AdmittedLike {
        match admit_like(data, request).await.unwrap() {
            Admission::Admitted(admitted) => admitted,
            Admission::Rejected(rejection) => panic!("unexpected rejection: {rejection:?}"),
        }
    }

    async fn expect_rejected(data: &Data, request: LikeRequest) -> Rejection {
        match admit_like(data, request).await.unwrap() {
            Admission::Rejected(rejection) => rejection,
            Admission::Admitted(admitted) => panic!("unexpected admission: {admitted:?}"),
        }
    }

    async fn remaining(data: &Data, user_id: u64) -> Option<u32> {
        data.quota
            .remaining(user_id, EffectiveLimit::Daily(1))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_arguments_are_reported_before_the_channel_gate() {
        let dir = tempfile::tempdir().unwrap();
        let data = test_data(&dir, "http://127.0.0.1:9/like").await;

        let mut incomplete = request(7, OTHER_CHANNEL, true);
        incomplete.region = Some("123456".to_owned());
        incomplete.uid = None;

        assert_eq!(
            expect_rejected(&data, incomplete).await,
            Rejection::MissingInput(MissingInput::Region {
                uid: "123456".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn allow_list_only_gates_prefix_invocations_in_a_server() {
        let dir = tempfile::tempdir().unwrap();
        let data = test_data(&dir, "http://127.0.0.1:9/like").await;

        assert_eq!(
            expect_rejected(&data, request(7, OTHER_CHANNEL, true)).await,
            Rejection::ChannelNotAllowed
        );

        drop(expect_admitted(&data, request(7, ALLOWED_CHANNEL, true)).await);
        drop(expect_admitted(&data, request(7, OTHER_CHANNEL, false)).await);

        let mut direct = request(7, OTHER_CHANNEL, true);
        direct.guild_id = None;
        drop(expect_admitted(&data, direct).await);
    }

    #[tokio::test]
    async fn exhausted_quota_blocks_before_any_request_is_sent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/like", listener.local_addr().unwrap());
        let dir = tempfile::tempdir().unwrap();
        let data = test_data(&dir, &url).await;
        data.quota.record_usage(7).await.unwrap();

        assert_eq!(
            expect_rejected(&data, request(7, ALLOWED_CHANNEL, true)).await,
            Rejection::DailyLimitReached { limit: 1 }
        );

        let contacted =
            tokio::time::timeout(Duration::from_millis(50), listener.accept()).await;
        assert!(contacted.is_err());
    }

    #[tokio::test]
    async fn unlimited_users_pass_the_quota_gate() {
        let dir = tempfile::tempdir().unwrap();
        let data = test_data(&dir, "http://127.0.0.1:9/like").await;
        for _ in 0..3 {
            data.quota.record_usage(UNLIMITED_USER).await.unwrap();
        }

        let admitted =
            expect_admitted(&data, request(UNLIMITED_USER, ALLOWED_CHANNEL, true)).await;
        assert_eq!(admitted.limit, EffectiveLimit::Unlimited);
    }

    #[tokio::test]
    async fn success_consumes_one_request() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"status":1,"player":{"nickname":"Foo","uid":"123456","region":"BR"}}"#,
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let data = test_data(&dir, &url).await;

        let admitted = expect_admitted(&data, request(7, ALLOWED_CHANNEL, true)).await;
        let decision = dispatch_like(&data, admitted).await.unwrap();
        server.await.unwrap();

        let LikeDecision::Completed {
            outcome,
            limit,
            remaining: left,
        } = decision
        else {
            panic!("expected a completed request");
        };
        assert!(outcome.is_success());
        assert_eq!(limit, EffectiveLimit::Daily(1));
        assert_eq!(left, Some(0));

        assert_eq!(remaining(&data, 7).await, Some(0));
        assert_eq!(
            expect_rejected(&data, request(7, ALLOWED_CHANNEL, true)).await,
            Rejection::DailyLimitReached { limit: 1 }
        );
    }

    #[tokio::test]
    async fn unsuccessful_outcomes_leave_quota_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = test_data(&dir, "http://127.0.0.1:9/like").await;

        let cases = [
            (r#"{"status":2}"#, LikeOutcome::AlreadyMaxed),
            (
                r#"{"status":0,"error":"Failder"}"#,
                LikeOutcome::AlreadyMaxed,
            ),
            (r#"{"status":3}"#, LikeOutcome::Failed { status: Some(3) }),
        ];

        for (body, expected) in cases {
            let (url, server) = serve_once("200 OK", body).await;
            data.likes = LikeClient::new(&url, "GREAT", None).unwrap();

            let admitted = expect_admitted(&data, request(7, ALLOWED_CHANNEL, true)).await;
            let decision = dispatch_like(&data, admitted).await.unwrap();
            server.await.unwrap();

            let LikeDecision::Completed {
                outcome,
                remaining: left,
                ..
            } = decision
            else {
                panic!("expected a completed request for {body}");
            };
            assert_eq!(outcome, expected);
            assert_eq!(left, Some(1));
        }

        assert_eq!(remaining(&data, 7).await, Some(1));
    }

    #[tokio::test]
    async fn unavailable_service_leaves_quota_untouched() {
        let (url, server) = serve_once("503 Service Unavailable", "{}").await;
        let dir = tempfile::tempdir().unwrap();
        let data = test_data(&dir, &url).await;

        let admitted = expect_admitted(&data, request(7, ALLOWED_CHANNEL, true)).await;
        let decision = dispatch_like(&data, admitted).await.unwrap();
        server.await.unwrap();

        assert!(matches!(
            decision,
            LikeDecision::Unavailable(LikeError::ServiceUnavailable(status))
                if status.as_u16() == 503
        ));
        assert_eq!(remaining(&data, 7).await, Some(1));
    }
}
