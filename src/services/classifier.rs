use serde::Serialize;

use crate::models::{AssignmentRecord, Cv, CvView, RotationalStatus};

/// A CV with the flags the rotation views filter on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedCv {
    #[serde(flatten)]
    pub cv: Cv,
    pub current_assignment: Option<AssignmentRecord>,
    pub has_previous_assignments: bool,
    pub is_pending: bool,
    pub is_unassigned: bool,
}

pub fn classify(cv: Cv) -> ClassifiedCv {
    let current_assignment = cv.current_assignment().cloned();
    let status = cv.status();
    let has_previous_assignments = !cv.assigned_stations().is_empty();
    let is_pending = status == RotationalStatus::NotAssigned;
    let is_unassigned = current_assignment.is_none() && status == RotationalStatus::Assigned;

    ClassifiedCv {
        cv,
        current_assignment,
        has_previous_assignments,
        is_pending,
        is_unassigned,
    }
}

pub fn classify_all(cvs: Vec<Cv>) -> Vec<ClassifiedCv> {
    cvs.into_iter().map(classify).collect()
}

impl ClassifiedCv {
    pub fn in_view(&self, view: CvView) -> bool {
        match view {
            CvView::All => true,
            CvView::Pending => self.is_pending,
            CvView::Unassigned => self.is_unassigned,
            CvView::Assigned => self.current_assignment.is_some(),
        }
    }

    /// Case-insensitive substring match on NIC or full name.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.cv.nic.to_lowercase().contains(&needle)
            || self.cv.full_name.to_lowercase().contains(&needle)
    }
}

pub fn filter(cvs: &[ClassifiedCv], view: CvView, query: &str) -> Vec<ClassifiedCv> {
    cvs.iter()
        .filter(|cv| cv.in_view(view) && cv.matches_query(query))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolSummary {
    pub total: usize,
    pub pending: usize,
    pub unassigned: usize,
    pub assigned: usize,
}

pub fn summarize(cvs: &[ClassifiedCv]) -> PoolSummary {
    cvs.iter().fold(
        PoolSummary {
            total: cvs.len(),
            ..PoolSummary::default()
        },
        |mut summary, cv| {
            if cv.is_pending {
                summary.pending += 1;
            }
            if cv.is_unassigned {
                summary.unassigned += 1;
            }
            if cv.current_assignment.is_some() {
                summary.assigned += 1;
            }
            summary
        },
    )
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// 1-based pages; a page past the end comes back empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page).min(total_items);
    let end = start.saturating_add(per_page).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total_items,
        total_pages,
    }
}
