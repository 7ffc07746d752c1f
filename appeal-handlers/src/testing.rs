use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use appeal_core::{
    AccessGrant, AppealConfig, BanRecord, Clock, Data, DiscordUser, IdentityProvider,
    ModerationMessage, ModerationPlatform, SubmissionLock, SubmissionRecord, SubmissionStore,
    TokenCodec,
};

pub const NOW: u64 = 1_700_000_000;
pub const DAY: u64 = 86_400;
pub const USER_ID: &str = "80351110224678912";
pub const APPEALS_CHANNEL: u64 = 111;
pub const LOG_CHANNEL: u64 = 222;
pub const GUILD_ID: u64 = 333;
pub const ACCESS_TOKEN_LIFETIME: u64 = 604_800;

pub fn test_config() -> AppealConfig {
    AppealConfig {
        discord_client_id: "client".to_owned(),
        discord_client_secret: "secret".to_owned(),
        bot_token: "bot".to_owned(),
        guild_id: None,
        skip_ban_check: false,
        appeals_channel_id: APPEALS_CHANNEL,
        log_channel_id: None,
        disable_unban_link: false,
        use_form_envelope: false,
        jwt_secret: "test-signing-key".to_owned(),
        public_url: "https://appeals.example".to_owned(),
        blocked_users: HashSet::new(),
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    calls: AtomicUsize,
    reject: AtomicBool,
    redirect_uris: Mutex<Vec<String>>,
}

impl FakeIdentity {
    pub fn reject_exchange(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn redirect_uris(&self) -> Vec<String> {
        self.redirect_uris.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> anyhow::Result<AccessGrant> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.redirect_uris
            .lock()
            .unwrap()
            .push(redirect_uri.to_owned());
        if self.reject.load(Ordering::SeqCst) {
            anyhow::bail!("failed to get user access token (400 Bad Request)");
        }
        Ok(AccessGrant {
            access_token: format!("access-{code}"),
            expires_in: ACCESS_TOKEN_LIFETIME,
        })
    }

    async fn fetch_user(&self, _access_token: &str) -> anyhow::Result<DiscordUser> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DiscordUser {
            id: USER_ID.to_owned(),
            username: "maple".to_owned(),
            discriminator: "0".to_owned(),
            avatar: Some("a_1f2e".to_owned()),
            email: Some("maple@example.com".to_owned()),
        })
    }
}

#[derive(Default)]
pub struct FakePlatform {
    ban: Mutex<Option<BanRecord>>,
    ban_lookups: AtomicUsize,
    fail_ban_lookup: AtomicBool,
    posts: Mutex<Vec<(u64, ModerationMessage)>>,
    failing_channels: Mutex<HashSet<u64>>,
    post_delay_ms: AtomicU64,
    unbans: Mutex<Vec<(u64, String)>>,
}

impl FakePlatform {
    pub fn set_ban(&self, ban: Option<BanRecord>) {
        *self.ban.lock().unwrap() = ban;
    }

    pub fn fail_ban_lookup(&self) {
        self.fail_ban_lookup.store(true, Ordering::SeqCst);
    }

    pub fn fail_channel(&self, channel_id: u64) {
        self.failing_channels.lock().unwrap().insert(channel_id);
    }

    /// Make every post yield for a while, to interleave concurrent requests.
    pub fn delay_posts(&self, delay: Duration) {
        self.post_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn ban_lookups(&self) -> usize {
        self.ban_lookups.load(Ordering::SeqCst)
    }

    pub fn posts(&self) -> Vec<(u64, ModerationMessage)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn posts_to(&self, channel_id: u64) -> Vec<ModerationMessage> {
        self.posts()
            .into_iter()
            .filter(|(channel, _)| *channel == channel_id)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn unbans(&self) -> Vec<(u64, String)> {
        self.unbans.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.ban_lookups() + self.posts().len() + self.unbans().len()
    }
}

#[async_trait]
impl ModerationPlatform for FakePlatform {
    async fn fetch_ban(&self, _guild_id: u64, _user_id: &str) -> anyhow::Result<Option<BanRecord>> {
        self.ban_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_ban_lookup.load(Ordering::SeqCst) {
            anyhow::bail!("failed to fetch ban");
        }
        Ok(self.ban.lock().unwrap().clone())
    }

    async fn post_message(
        &self,
        channel_id: u64,
        message: &ModerationMessage,
    ) -> anyhow::Result<()> {
        let delay = self.post_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing_channels.lock().unwrap().contains(&channel_id) {
            anyhow::bail!("failed to submit message (403 Forbidden)");
        }
        self.posts
            .lock()
            .unwrap()
            .push((channel_id, message.clone()));
        Ok(())
    }

    async fn unban(&self, guild_id: u64, user_id: &str) -> anyhow::Result<()> {
        self.unbans
            .lock()
            .unwrap()
            .push((guild_id, user_id.to_owned()));
        Ok(())
    }
}

#[derive(Default)]
struct StoreState {
    records: Mutex<Vec<SubmissionRecord>>,
    lookups: AtomicUsize,
    locks_taken: AtomicUsize,
    failing: AtomicBool,
    user_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl StoreState {
    fn latest_since(&self, user_id: &str, since: u64) -> anyhow::Result<Option<SubmissionRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.user_id == user_id && record.submitted_at >= since)
            .max_by_key(|record| record.submitted_at)
            .cloned())
    }
}

/// Submission store with a per-user try-lock, mirroring the advisory lock.
#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<StoreState>,
}

impl FakeStore {
    pub fn seed(&self, user_id: &str, submitted_at: u64) {
        self.state.records.lock().unwrap().push(SubmissionRecord {
            user_id: user_id.to_owned(),
            submitted_at,
        });
    }

    pub fn fail(&self) {
        self.state.failing.store(true, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<SubmissionRecord> {
        self.state.records.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> usize {
        self.state.lookups.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.lookups() + self.state.locks_taken.load(Ordering::SeqCst)
    }

    fn user_mutex(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.state
            .user_locks
            .lock()
            .unwrap()
            .entry(user_id.to_owned())
            .or_default()
            .clone()
    }

    /// Occupy the user's lock as if another request were mid-submission.
    pub fn hold_lock(&self, user_id: &str) -> OwnedMutexGuard<()> {
        self.user_mutex(user_id).try_lock_owned().unwrap()
    }
}

struct FakeLock {
    state: Arc<StoreState>,
    user_id: String,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl SubmissionStore for FakeStore {
    async fn find_recent_submission(
        &self,
        user_id: &str,
        since: u64,
    ) -> anyhow::Result<Option<SubmissionRecord>> {
        self.state.latest_since(user_id, since)
    }

    async fn try_lock_user(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Option<Box<dyn SubmissionLock>>> {
        self.state.locks_taken.fetch_add(1, Ordering::SeqCst);
        if self.state.failing.load(Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        let Ok(guard) = self.user_mutex(user_id).try_lock_owned() else {
            return Ok(None);
        };

        Ok(Some(Box::new(FakeLock {
            state: self.state.clone(),
            user_id: user_id.to_owned(),
            _guard: guard,
        })))
    }
}

#[async_trait]
impl SubmissionLock for FakeLock {
    async fn find_recent_submission(
        &mut self,
        since: u64,
    ) -> anyhow::Result<Option<SubmissionRecord>> {
        self.state.latest_since(&self.user_id, since)
    }

    async fn record_submission(self: Box<Self>, submitted_at: u64) -> anyhow::Result<()> {
        self.state.records.lock().unwrap().push(SubmissionRecord {
            user_id: self.user_id.clone(),
            submitted_at,
        });
        Ok(())
    }
}

pub struct FixedClock(pub AtomicU64);

impl Clock for FixedClock {
    fn now_unix_secs(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub config: AppealConfig,
    pub identity: Arc<FakeIdentity>,
    pub platform: Arc<FakePlatform>,
    pub store: FakeStore,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            identity: Arc::default(),
            platform: Arc::default(),
            store: FakeStore::default(),
            clock: Arc::new(FixedClock(AtomicU64::new(NOW))),
        }
    }

    pub fn block(mut self, user_id: &str) -> Self {
        self.config.blocked_users.insert(user_id.to_owned());
        self
    }

    pub fn with_guild(mut self) -> Self {
        self.config.guild_id = Some(GUILD_ID);
        self
    }

    pub fn skip_ban_check(mut self) -> Self {
        self.config.skip_ban_check = true;
        self
    }

    pub fn with_log_channel(mut self) -> Self {
        self.config.log_channel_id = Some(LOG_CHANNEL);
        self
    }

    pub fn without_unban_link(mut self) -> Self {
        self.config.disable_unban_link = true;
        self
    }

    pub fn with_form_envelope(mut self) -> Self {
        self.config.use_form_envelope = true;
        self
    }

    pub fn set_now(&self, now: u64) {
        self.clock.0.store(now, Ordering::SeqCst);
    }

    pub fn data(&self) -> Data {
        Data {
            config: Arc::new(self.config.clone()),
            codec: TokenCodec::new(&self.config.jwt_secret),
            identity: self.identity.clone(),
            platform: self.platform.clone(),
            store: Arc::new(self.store.clone()),
            clock: self.clock.clone(),
        }
    }

    /// Every call that would leave the process in production.
    pub fn network_calls(&self) -> usize {
        self.identity.calls() + self.platform.calls() + self.store.calls()
    }
}
