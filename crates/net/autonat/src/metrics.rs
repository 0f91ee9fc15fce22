//! AutoNAT metrics

use metrics::Counter;

use crate::codec::DialStatus;

/// Verifier metrics
#[derive(Clone, Debug)]
pub(crate) struct ServerMetrics {
    /// Dial requests received
    requests_total: Counter,
    /// Dial requests that ended with a stream abort
    aborted_total: Counter,
    /// Candidates refused by dial policy
    refused_total: Counter,
    /// Amplification challenges issued
    challenges_total: Counter,
    /// Bytes of dial data received
    dial_data_bytes_total: Counter,
    dial_back_ok_total: Counter,
    dial_back_dial_error_total: Counter,
    dial_back_error_total: Counter,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self {
            requests_total: metrics::counter!("autonat_server_requests_total"),
            aborted_total: metrics::counter!("autonat_server_aborted_total"),
            refused_total: metrics::counter!("autonat_server_refused_total"),
            challenges_total: metrics::counter!("autonat_server_challenges_total"),
            dial_data_bytes_total: metrics::counter!("autonat_server_dial_data_bytes_total"),
            dial_back_ok_total: metrics::counter!(
                "autonat_server_dial_backs_total",
                "status" => DialStatus::Ok.as_str()
            ),
            dial_back_dial_error_total: metrics::counter!(
                "autonat_server_dial_backs_total",
                "status" => DialStatus::DialError.as_str()
            ),
            dial_back_error_total: metrics::counter!(
                "autonat_server_dial_backs_total",
                "status" => DialStatus::DialBackError.as_str()
            ),
        }
    }
}

impl ServerMetrics {
    pub(crate) fn inc_requests(&self) {
        self.requests_total.increment(1);
    }

    pub(crate) fn inc_aborted(&self) {
        self.aborted_total.increment(1);
    }

    pub(crate) fn inc_refused(&self) {
        self.refused_total.increment(1);
    }

    pub(crate) fn record_challenge(&self, received: u64) {
        self.challenges_total.increment(1);
        self.dial_data_bytes_total.increment(received);
    }

    /// Records the outcome of an attempted dial-back.
    pub(crate) fn record_dial_back(&self, status: DialStatus) {
        match status {
            DialStatus::Ok => self.dial_back_ok_total.increment(1),
            DialStatus::DialError => self.dial_back_dial_error_total.increment(1),
            DialStatus::DialBackError => self.dial_back_error_total.increment(1),
            DialStatus::Unused => {}
        }
    }
}

/// Requester metrics
#[derive(Clone, Debug)]
pub(crate) struct ClientMetrics {
    /// Verification requests sent
    verifications_total: Counter,
    /// Verification requests that failed before the verifier closed the stream
    failed_total: Counter,
    /// Bytes of dial data sent to verifiers
    dial_data_bytes_total: Counter,
    /// Dial-backs whose nonce matched a pending request
    dial_backs_confirmed_total: Counter,
    /// Dial-backs rejected for an unknown nonce or malformed message
    dial_backs_rejected_total: Counter,
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self {
            verifications_total: metrics::counter!("autonat_client_verifications_total"),
            failed_total: metrics::counter!("autonat_client_failed_total"),
            dial_data_bytes_total: metrics::counter!("autonat_client_dial_data_bytes_total"),
            dial_backs_confirmed_total: metrics::counter!(
                "autonat_client_dial_backs_confirmed_total"
            ),
            dial_backs_rejected_total: metrics::counter!(
                "autonat_client_dial_backs_rejected_total"
            ),
        }
    }
}

impl ClientMetrics {
    pub(crate) fn inc_verifications(&self) {
        self.verifications_total.increment(1);
    }

    pub(crate) fn inc_failed(&self) {
        self.failed_total.increment(1);
    }

    pub(crate) fn add_dial_data_bytes(&self, bytes: u64) {
        self.dial_data_bytes_total.increment(bytes);
    }

    pub(crate) fn inc_dial_backs_confirmed(&self) {
        self.dial_backs_confirmed_total.increment(1);
    }

    pub(crate) fn inc_dial_backs_rejected(&self) {
        self.dial_backs_rejected_total.increment(1);
    }
}
