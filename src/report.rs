// CSV export of workflow records, one row per line item

use chrono::{DateTime, Utc};
use clap::ValueEnum;

use crate::workflows::{LineItem, RequestId, WorkflowService};

const HEADER: &str = "kind,request_id,branch,counterparty,status,requested_by,requested_at,priority,line,product_id,product_name,quantity,batch_number,expiry_date,reason";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    All,
    Requisitions,
    Transfers,
    Releases,
    Disposals,
}

impl ReportKind {
    fn includes(self, other: ReportKind) -> bool {
        self == ReportKind::All || self == other
    }
}

/// Request-level columns shared by every line of a record
struct RecordColumns<'a> {
    kind: &'static str,
    id: RequestId,
    branch: &'a str,
    counterparty: &'a str,
    status: &'static str,
    requested_by: &'a str,
    requested_at: DateTime<Utc>,
    priority: &'a str,
}

pub async fn export_csv(service: &WorkflowService, kind: ReportKind) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');

    if kind.includes(ReportKind::Requisitions) {
        for r in service.requisitions().await {
            let priority = r.priority.to_string();
            let columns = RecordColumns {
                kind: "requisition",
                id: r.id,
                branch: r.branch_id.as_str(),
                counterparty: "",
                status: r.status.label(),
                requested_by: &r.requested_by,
                requested_at: r.requested_at,
                priority: &priority,
            };
            push_rows(&mut csv, &columns, &r.items);
        }
    }

    if kind.includes(ReportKind::Transfers) {
        for t in service.transfers().await {
            let columns = RecordColumns {
                kind: "transfer",
                id: t.id,
                branch: t.source_branch_id.as_str(),
                counterparty: t.target_branch_id.as_str(),
                status: t.status.label(),
                requested_by: &t.requested_by,
                requested_at: t.requested_at,
                priority: "",
            };
            push_rows(&mut csv, &columns, &t.items);
        }
    }

    if kind.includes(ReportKind::Releases) {
        for r in service.releases().await {
            let columns = RecordColumns {
                kind: "release",
                id: r.id,
                branch: r.branch_id.as_str(),
                counterparty: "",
                status: r.status.label(),
                requested_by: &r.requested_by,
                requested_at: r.requested_at,
                priority: "",
            };
            push_rows(&mut csv, &columns, &r.items);
        }
    }

    if kind.includes(ReportKind::Disposals) {
        for d in service.disposals().await {
            let columns = RecordColumns {
                kind: "disposal",
                id: d.id,
                branch: d.branch_id.as_str(),
                counterparty: "",
                status: d.status.label(),
                requested_by: &d.requested_by,
                requested_at: d.requested_at,
                priority: "",
            };
            push_rows(&mut csv, &columns, &d.items);
        }
    }

    csv
}

fn push_rows(csv: &mut String, columns: &RecordColumns<'_>, items: &[LineItem]) {
    for (line, item) in items.iter().enumerate() {
        let fields = [
            columns.kind.to_string(),
            columns.id.to_string(),
            columns.branch.to_string(),
            columns.counterparty.to_string(),
            columns.status.to_string(),
            columns.requested_by.to_string(),
            columns.requested_at.to_rfc3339(),
            columns.priority.to_string(),
            line.to_string(),
            item.product_id.to_string(),
            item.product_name.clone(),
            item.quantity.to_string(),
            item.batch_number.clone().unwrap_or_default(),
            item.expiry_date.map(|d| d.to_string()).unwrap_or_default(),
            item.reason_text().unwrap_or_default().to_string(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
}

/// Quote a field only when it contains a comma; quotes inside a quoted field are doubled
pub fn csv_field(value: &str) -> String {
    if value.contains(',') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
