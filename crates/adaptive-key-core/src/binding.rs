// Adaptive Key Bindings
// Opaque output actions and the bounded lists an adaptive key plays

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::key::{KeyIdentity, KeyParseError};

/// Maximum number of bindings in one output list
pub const MAX_BINDINGS: usize = 8;

/// Maximum number of parameters a binding carries
pub const MAX_BINDING_PARAMS: usize = 2;

/// Behaviors whose first parameter is a key parameter rather than a number
const KEY_PARAM_BEHAVIORS: &[&str] = &["kp", "kt", "sk"];

/// Errors from building a binding or a binding list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("binding must start with '&': '{0}'")]
    MissingBehavior(String),

    #[error("binding '{binding}' has {count} parameters, at most {max} are allowed")]
    TooManyParams {
        binding: String,
        count: usize,
        max: usize,
    },

    #[error("invalid binding parameter '{param}': {source}")]
    InvalidParam {
        param: String,
        #[source]
        source: KeyParseError,
    },

    #[error("binding list cannot be empty")]
    EmptyList,

    #[error("binding list has {count} entries, at most {max} are allowed")]
    TooManyBindings { count: usize, max: usize },
}

/// An output action, meaningful only to the action executor.
///
/// Written as `&<behavior> [param1 [param2]]`, e.g. `&kp LS(A)` or `&mo 1`.
/// Key parameters are stored in the packed key encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    behavior: String,
    params: SmallVec<[u32; MAX_BINDING_PARAMS]>,
}

impl Binding {
    /// Create a binding from a behavior name and raw parameters
    pub fn new(
        behavior: impl Into<String>,
        params: impl IntoIterator<Item = u32>,
    ) -> Result<Self, BindingError> {
        let behavior = behavior.into();
        let params: Vec<u32> = params.into_iter().collect();
        if params.len() > MAX_BINDING_PARAMS {
            return Err(BindingError::TooManyParams {
                binding: format!("&{}", behavior),
                count: params.len(),
                max: MAX_BINDING_PARAMS,
            });
        }
        Ok(Self {
            behavior,
            params: params.into_iter().collect(),
        })
    }

    /// Key press binding (`&kp <key>`)
    pub fn key_press(key: KeyIdentity) -> Self {
        let mut params = SmallVec::new();
        params.push(key.encode());
        Self {
            behavior: "kp".to_string(),
            params,
        }
    }

    pub fn behavior(&self) -> &str {
        &self.behavior
    }

    pub fn params(&self) -> &[u32] {
        &self.params
    }

    pub fn param1(&self) -> u32 {
        self.params.first().copied().unwrap_or(0)
    }

    pub fn param2(&self) -> u32 {
        self.params.get(1).copied().unwrap_or(0)
    }

    /// The key this binding emits, for key press style behaviors
    pub fn key(&self) -> Option<KeyIdentity> {
        if self.takes_key_param() {
            self.params.first().map(|p| KeyIdentity::decode(*p))
        } else {
            None
        }
    }

    fn takes_key_param(&self) -> bool {
        KEY_PARAM_BEHAVIORS.contains(&self.behavior.as_str())
    }
}

fn parse_param(text: &str) -> Result<u32, BindingError> {
    if text.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(value) = text.parse::<u32>() {
            return Ok(value);
        }
    }
    text.parse::<KeyIdentity>()
        .map(|key| key.encode())
        .map_err(|source| BindingError::InvalidParam {
            param: text.to_string(),
            source,
        })
}

impl FromStr for Binding {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let behavior = parts
            .next()
            .and_then(|head| head.strip_prefix('&'))
            .filter(|name| !name.is_empty())
            .ok_or_else(|| BindingError::MissingBehavior(s.trim().to_string()))?;

        let raw: Vec<&str> = parts.collect();
        if raw.len() > MAX_BINDING_PARAMS {
            return Err(BindingError::TooManyParams {
                binding: s.trim().to_string(),
                count: raw.len(),
                max: MAX_BINDING_PARAMS,
            });
        }

        let params = raw
            .iter()
            .map(|p| parse_param(p))
            .collect::<Result<SmallVec<[u32; MAX_BINDING_PARAMS]>, _>>()?;

        Ok(Self {
            behavior: behavior.to_string(),
            params,
        })
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}", self.behavior)?;
        for (i, param) in self.params.iter().enumerate() {
            if i == 0 && self.takes_key_param() {
                write!(f, " {}", KeyIdentity::decode(*param))?;
            } else {
                write!(f, " {}", param)?;
            }
        }
        Ok(())
    }
}

/// Ordered, non-empty list of at most [`MAX_BINDINGS`] bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingList {
    bindings: SmallVec<[Binding; MAX_BINDINGS]>,
}

impl BindingList {
    /// Build a list, rejecting empty and over-capacity input
    pub fn new(bindings: impl IntoIterator<Item = Binding>) -> Result<Self, BindingError> {
        let bindings: SmallVec<[Binding; MAX_BINDINGS]> = bindings.into_iter().collect();
        if bindings.is_empty() {
            return Err(BindingError::EmptyList);
        }
        if bindings.len() > MAX_BINDINGS {
            return Err(BindingError::TooManyBindings {
                count: bindings.len(),
                max: MAX_BINDINGS,
            });
        }
        Ok(Self { bindings })
    }

    /// A list holding a single binding
    pub fn single(binding: Binding) -> Self {
        let mut bindings = SmallVec::new();
        bindings.push(binding);
        Self { bindings }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.bindings.iter()
    }

    pub fn as_slice(&self) -> &[Binding] {
        &self.bindings
    }

    /// The binding held until release, and the ones tapped before it
    pub fn split_last(&self) -> (&Binding, &[Binding]) {
        match self.bindings.split_last() {
            Some(split) => split,
            // Construction guarantees at least one entry.
            None => unreachable!("binding list is never empty"),
        }
    }

    /// The binding held until release
    pub fn last(&self) -> &Binding {
        self.split_last().0
    }
}

impl<'a> IntoIterator for &'a BindingList {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}

impl fmt::Display for BindingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.bindings.iter().map(|b| b.to_string()).collect();
        write!(f, "[{}]", items.join(", "))
    }
}
