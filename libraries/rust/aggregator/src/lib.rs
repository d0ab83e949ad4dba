// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2022 JET PROTOCOL HOLDINGS, LLC.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Filters, flattens and re-encodes batches of Solana instructions that were
//! produced by an external builder, so they can be forwarded through a
//! wrapper program or persisted as JSON.
//!
//! Everything here is a pure transform over borrowed input. Order is
//! preserved throughout and account references are never collapsed unless
//! a [`DedupPolicy`] asks for it.

pub mod accounts;
pub mod artifact;
pub mod batch;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod forward;
pub mod inspect;
pub mod payload;

pub use accounts::{dedup_accounts, flatten_accounts, flatten_accounts_with, signers, DedupPolicy};
pub use artifact::{
    deserialize, from_json, serialize, to_json_pretty, ArtifactFile, GroupedArtifacts,
    SerializedAccount, SerializedInstruction,
};
pub use batch::{DepositInstructions, InstructionBatch};
pub use encoding::{Encoding, TextEncoding};
pub use error::{AggregatorError, DecodingError, EncodingError};
pub use filter::{filter, filter_by_program, Selection};
pub use forward::{ForwardPlan, WrapperInterface};
pub use inspect::describe;
pub use payload::{extract_payloads, payload_len};
