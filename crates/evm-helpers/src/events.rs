// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::sol;

sol! {
    #[derive(Debug)]
    event ReportCreated(string indexed reportId, address indexed creator, uint256 timestamp);

    #[derive(Debug)]
    event ReportVerified(string indexed reportId, uint32 severity);
}
