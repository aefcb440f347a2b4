//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use mcommon::{MessageId, SessionId, UserId};
//!
//! let user = UserId::from("uid-1");
//! let session = SessionId::new("1700000000000-1234");
//! let message = MessageId::generate();
//!
//! assert_eq!(user.as_str(), "uid-1");
//! assert_eq!(session.to_string(), "1700000000000-1234");
//! assert_eq!(message.as_str().len(), 20);
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use mcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use mcommon::{SessionId, UserId};
    //!
    //! let user = UserId::new("uid-42");
    //! let session = SessionId::from("session-42");
    //!
    //! assert_eq!(user.to_string(), "uid-42");
    //! assert_eq!(session.as_str(), "session-42");
    //! ```

    use std::fmt::{Display, Formatter};

    use serde::{Deserialize, Serialize};

    macro_rules! string_id {
        ($(#[$meta:meta])* $name:ident) => {
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                pub fn as_str(&self) -> &str {
                    self.0.as_str()
                }

                pub fn into_inner(self) -> String {
                    self.0
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<String> for $name {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    self.0.as_str()
                }
            }
        };
    }

    string_id!(
        /// Identifier issued by the authentication provider for a signed-in identity.
        UserId
    );
    string_id!(SessionId);
    string_id!(MessageId);

    impl SessionId {
        /// Epoch millis followed by four random digits.
        pub fn generate() -> Self {
            Self(crate::ids::session_token(crate::clock::now_millis()))
        }
    }

    impl MessageId {
        pub fn generate() -> Self {
            Self(crate::ids::push_id())
        }
    }
}

pub mod clock {
    //! Wall-clock helpers expressed in epoch milliseconds.
    //!
    //! ```rust
    //! let now = mcommon::now_millis();
    //! assert!(now > 1_600_000_000_000);
    //! ```

    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or_default()
    }
}

pub mod ids {
    //! Opaque token and time-ordered key generation.
    //!
    //! ```rust
    //! use mcommon::{opaque_token, push_id};
    //!
    //! let token = opaque_token(16);
    //! assert_eq!(token.len(), 16);
    //! assert!(token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    //!
    //! let first = push_id();
    //! let second = push_id();
    //! assert!(first < second);
    //! ```

    use std::sync::Mutex;

    use rand::Rng;

    const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    const PUSH_CHARSET: &[u8] =
        b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
    const PUSH_RANDOM_LEN: usize = 12;

    /// Random uppercase alphanumeric token, used for public account ids.
    pub fn opaque_token(length: usize) -> String {
        let mut rng = rand::rng();
        (0..length)
            .map(|_| {
                let idx = rng.random_range(0..TOKEN_CHARSET.len());
                TOKEN_CHARSET[idx] as char
            })
            .collect()
    }

    pub(crate) fn session_token(millis: i64) -> String {
        let mut rng = rand::rng();
        format!("{millis}{:04}", rng.random_range(0..10_000))
    }

    struct PushState {
        last_millis: i64,
        last_random: [u8; PUSH_RANDOM_LEN],
    }

    /// Generator for twenty-character keys that sort by creation time.
    ///
    /// Keys generated within the same millisecond increment the random tail so
    /// ordering still holds inside one generator.
    pub struct PushIdGenerator {
        state: Mutex<PushState>,
    }

    impl PushIdGenerator {
        pub const fn new() -> Self {
            Self {
                state: Mutex::new(PushState {
                    last_millis: i64::MIN,
                    last_random: [0; PUSH_RANDOM_LEN],
                }),
            }
        }

        pub fn generate(&self) -> String {
            self.generate_at(crate::clock::now_millis())
        }

        pub fn generate_at(&self, millis: i64) -> String {
            let mut state = match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            if millis == state.last_millis {
                increment_random(&mut state.last_random);
            } else {
                let mut rng = rand::rng();
                for slot in state.last_random.iter_mut() {
                    *slot = rng.random_range(0..PUSH_CHARSET.len() as u8);
                }
                state.last_millis = millis;
            }

            let mut time_chars = [0_u8; 8];
            let mut remaining = millis.max(0) as u64;
            for slot in time_chars.iter_mut().rev() {
                *slot = PUSH_CHARSET[(remaining % 64) as usize];
                remaining /= 64;
            }

            let mut id = String::with_capacity(8 + PUSH_RANDOM_LEN);
            id.extend(time_chars.iter().map(|byte| *byte as char));
            id.extend(
                state
                    .last_random
                    .iter()
                    .map(|index| PUSH_CHARSET[*index as usize] as char),
            );
            id
        }
    }

    impl Default for PushIdGenerator {
        fn default() -> Self {
            Self::new()
        }
    }

    static PUSH_IDS: PushIdGenerator = PushIdGenerator::new();

    pub fn push_id() -> String {
        PUSH_IDS.generate()
    }

    fn increment_random(random: &mut [u8; PUSH_RANDOM_LEN]) {
        for slot in random.iter_mut().rev() {
            if (*slot as usize) < PUSH_CHARSET.len() - 1 {
                *slot += 1;
                return;
            }
            *slot = 0;
        }
    }
}

pub use clock::now_millis;
pub use context::{MessageId, SessionId, UserId};
pub use future::BoxFuture;
pub use ids::{PushIdGenerator, opaque_token, push_id};
