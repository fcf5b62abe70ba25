//! Subject/body rendering (`spec.md` §4.4). Pure string templating, tested
//! without any SMTP involved.

use timelockwatch_common::{Address, FlowStatus};

pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// `reply_base_url` is the externally reachable base for the emergency
/// reply link, e.g. `https://timelockwatch.example`.
pub fn render(
    contract_address: Address,
    status_to: FlowStatus,
    emergency: bool,
    reply_base_url: &str,
    reply_token: Option<&str>,
) -> RenderedMessage {
    let subject = match status_to {
        FlowStatus::Waiting if emergency => {
            format!("[ACTION REQUIRED] New timelock proposal on {contract_address}")
        }
        FlowStatus::Waiting => format!("New timelock proposal queued on {contract_address}"),
        FlowStatus::Ready => format!("Timelock proposal on {contract_address} is ready to execute"),
        FlowStatus::Executed => format!("Timelock proposal on {contract_address} executed"),
        FlowStatus::Cancelled => format!("Timelock proposal on {contract_address} cancelled"),
        FlowStatus::Expired => format!("Timelock proposal on {contract_address} expired unexecuted"),
    };

    let mut body = match status_to {
        FlowStatus::Waiting => {
            format!("A new proposal was queued on timelock {contract_address}.")
        }
        FlowStatus::Ready => format!("The timelock delay has elapsed for a proposal on {contract_address}."),
        FlowStatus::Executed => format!("A proposal on {contract_address} was executed on-chain."),
        FlowStatus::Cancelled => format!("A proposal on {contract_address} was cancelled."),
        FlowStatus::Expired => {
            format!("A proposal on {contract_address} expired without execution during its grace period.")
        }
    };

    if emergency {
        if let Some(token) = reply_token {
            body.push_str(&format!(
                "\n\nThis contract is in emergency mode. Confirm you have seen this notice: \
                 {reply_base_url}/emergency-reply?token={token}"
            ));
        }
    }

    RenderedMessage { subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn addr() -> Address {
        Address::from_str("0x0000000000000000000000000000000000000001").unwrap()
    }

    #[test]
    fn emergency_waiting_includes_reply_link() {
        let rendered = render(addr(), FlowStatus::Waiting, true, "https://tlw.example", Some("abc123"));
        assert!(rendered.subject.starts_with("[ACTION REQUIRED]"));
        assert!(rendered.body.contains("https://tlw.example/emergency-reply?token=abc123"));
    }

    #[test]
    fn non_emergency_never_includes_reply_link() {
        let rendered = render(addr(), FlowStatus::Waiting, false, "https://tlw.example", None);
        assert!(!rendered.body.contains("emergency-reply"));
    }
}
