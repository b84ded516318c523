/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;

use crate::common::Stopped;

/// Errors returned by [`Mailbox::send`](crate::mailbox::Mailbox::send).
///
/// Receiving never errors; a closed receive channel is the normal
/// end-of-stream signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The mailbox has not been started yet.
    NotStarted,
    /// The mailbox has been stopped; the message was not accepted.
    Stopped,
    /// The caller's own context ended while the send was waiting, wrapping
    /// that context's terminal error.
    Canceled(Stopped),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::NotStarted => write!(f, "mailbox not started"),
            SendError::Stopped => write!(f, "mailbox stopped"),
            SendError::Canceled(cause) => write!(f, "send canceled: {cause}"),
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SendError::Canceled(cause) => Some(cause),
            _ => None,
        }
    }
}
