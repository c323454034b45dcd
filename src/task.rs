// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle of an asynchronously derived value.

/// State of a value produced by an asynchronous operation.
///
/// `Reloading` keeps the payload of the last successful run so consumers can
/// keep displaying it while a fresh run is in flight. `Loading` never carries
/// a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncResult<T, E = String> {
    /// Not started
    Pending,
    /// First run in flight, nothing to show yet
    Loading,
    /// New run in flight, previous payload still valid
    Reloading { data: T },
    Successful { data: T },
    Failed { error: E },
}

impl<T, E> Default for AsyncResult<T, E> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T, E> AsyncResult<T, E> {
    /// Returns the payload if one is available, including while reloading
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Reloading { data } | Self::Successful { data } => Some(data),
            Self::Pending | Self::Loading | Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_data_available(&self) -> bool {
        self.data().is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Loading | Self::Reloading { .. })
    }

    /// Transition taken when a new run starts.
    ///
    /// Keeps the payload (as `Reloading`) when there is one, otherwise
    /// becomes `Loading`.
    pub fn into_reloading(self) -> Self {
        match self {
            Self::Reloading { data } | Self::Successful { data } => Self::Reloading { data },
            Self::Pending | Self::Loading | Self::Failed { .. } => Self::Loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Task = AsyncResult<u32, String>;

    #[test]
    fn test_default_is_pending() {
        assert_eq!(Task::default(), Task::Pending);
    }

    #[test]
    fn test_reloading_keeps_last_payload() {
        let next = Task::Successful { data: 7 }.into_reloading();
        assert_eq!(next, Task::Reloading { data: 7 });
        assert_eq!(next.data(), Some(&7));
        assert!(next.is_in_flight());

        // a second block while reloading still carries the same payload
        assert_eq!(next.into_reloading(), Task::Reloading { data: 7 });
    }

    #[test]
    fn test_loading_never_carries_payload() {
        for start in [
            Task::Pending,
            Task::Loading,
            Task::Failed {
                error: "boom".to_string(),
            },
        ] {
            let next = start.into_reloading();
            assert_eq!(next, Task::Loading);
            assert!(next.data().is_none());
        }
    }

    #[test]
    fn test_error_accessor() {
        let failed = Task::Failed {
            error: "no gas".to_string(),
        };
        assert_eq!(failed.error().map(String::as_str), Some("no gas"));
        assert!(!failed.is_data_available());
        assert!(Task::Successful { data: 1 }.error().is_none());
    }
}
