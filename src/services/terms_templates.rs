//! Contract terms, one template per care type.

use crate::models::care_type::CareType;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct TermsTemplate {
    pub title: &'static str,
    pub scope: &'static str,
    pub duties: &'static [&'static str],
    /// Suggested hourly range in cents.
    pub rate_guidance_cents: (i64, i64),
}

impl TermsTemplate {
    pub fn rate_guidance(&self) -> (Decimal, Decimal) {
        let (min, max) = self.rate_guidance_cents;
        (Decimal::new(min, 2), Decimal::new(max, 2))
    }
}

const ELDERLY_CARE: TermsTemplate = TermsTemplate {
    title: "Elderly Care Services Agreement",
    scope: "in-home nursing support for an older adult, focused on safety, mobility and daily wellbeing",
    duties: &[
        "medication administration and reminders as prescribed",
        "assistance with mobility, transfers and fall prevention",
        "monitoring of vital signs and reporting of changes in condition",
        "support with personal care and nutrition",
    ],
    rate_guidance_cents: (3500, 5500),
};

const POST_OPERATIVE: TermsTemplate = TermsTemplate {
    title: "Post-Operative Care Services Agreement",
    scope: "skilled nursing care during recovery following a surgical procedure",
    duties: &[
        "wound assessment and dressing changes per the discharge plan",
        "pain assessment and medication management",
        "monitoring for signs of infection or complications",
        "support with prescribed exercises and early mobilisation",
    ],
    rate_guidance_cents: (4500, 7000),
};

const PEDIATRIC: TermsTemplate = TermsTemplate {
    title: "Pediatric Nursing Services Agreement",
    scope: "nursing care for an infant, child or adolescent in the family home",
    duties: &[
        "age-appropriate clinical care and medication administration",
        "monitoring of growth, feeding and developmental milestones",
        "coordination with parents or guardians on the care plan",
    ],
    rate_guidance_cents: (4000, 6500),
};

const PALLIATIVE: TermsTemplate = TermsTemplate {
    title: "Palliative Care Services Agreement",
    scope: "comfort-focused nursing care for a client with a life-limiting illness",
    duties: &[
        "symptom and pain management in line with the palliative plan",
        "emotional support for the client and family",
        "liaison with the client's physician and hospice team",
    ],
    rate_guidance_cents: (4500, 7500),
};

const DEMENTIA_CARE: TermsTemplate = TermsTemplate {
    title: "Dementia Care Services Agreement",
    scope: "nursing support for a client living with dementia or cognitive decline",
    duties: &[
        "structured daily routines and cognitive engagement",
        "management of behavioural symptoms with de-escalation techniques",
        "supervision to prevent wandering and injury",
        "medication administration and monitoring",
    ],
    rate_guidance_cents: (4000, 6000),
};

const DISABILITY_SUPPORT: TermsTemplate = TermsTemplate {
    title: "Disability Support Services Agreement",
    scope: "nursing support enabling a client with a disability to live independently",
    duties: &[
        "assistance with activities of daily living",
        "management of assistive equipment and clinical devices",
        "support with community access and personal goals",
    ],
    rate_guidance_cents: (3500, 6000),
};

const GENERAL: TermsTemplate = TermsTemplate {
    title: "Nursing Services Agreement",
    scope: "nursing services as described in the job posting",
    duties: &[
        "care within the nurse's scope of practice as agreed with the client",
        "accurate documentation of care delivered",
    ],
    rate_guidance_cents: (3500, 6500),
};

pub fn template_for(care_type: CareType) -> &'static TermsTemplate {
    match care_type {
        CareType::ElderlyCare => &ELDERLY_CARE,
        CareType::PostOperative => &POST_OPERATIVE,
        CareType::Pediatric => &PEDIATRIC,
        CareType::Palliative => &PALLIATIVE,
        CareType::DementiaCare => &DEMENTIA_CARE,
        CareType::DisabilitySupport => &DISABILITY_SUPPORT,
        CareType::General => &GENERAL,
    }
}

pub struct TermsContext<'a> {
    pub job_id: Uuid,
    pub job_title: &'a str,
    pub client_id: Uuid,
    pub nurse_id: Uuid,
    pub hourly_rate: Decimal,
    pub review_window_hours: i64,
    pub issued_on: NaiveDate,
}

/// Renders the terms text. Output depends only on the inputs, so the same
/// context always yields the same bytes.
pub fn render_terms(template: &TermsTemplate, ctx: &TermsContext<'_>) -> String {
    let (min, max) = template.rate_guidance();
    let mut text = String::new();
    text.push_str(template.title);
    text.push_str("\n\n");
    text.push_str(&format!("Issued: {}\n", ctx.issued_on.format("%Y-%m-%d")));
    text.push_str(&format!("Engagement: {} ({})\n", ctx.job_title, ctx.job_id));
    text.push_str(&format!("Client: {}\n", ctx.client_id));
    text.push_str(&format!("Independent contractor: {}\n\n", ctx.nurse_id));

    text.push_str("1. Scope of services\n");
    text.push_str(&format!("The contractor will provide {}.\n\n", template.scope));

    text.push_str("2. Duties\n");
    for (i, duty) in template.duties.iter().enumerate() {
        text.push_str(&format!("  {}.{} {}\n", 2, i + 1, duty));
    }
    text.push('\n');

    text.push_str("3. Compensation\n");
    text.push_str(&format!(
        "Hourly rate: {} (guidance for this care type: {} - {}).\n",
        ctx.hourly_rate, min, max
    ));
    text.push_str(
        "Hours are computed from the recorded start and end times less unpaid breaks.\n\n",
    );

    text.push_str("4. Timecards\n");
    text.push_str(&format!(
        "The client has {} hours from submission to approve or dispute a timecard. \
         Timecards not acted on within that window are approved automatically.\n\n",
        ctx.review_window_hours
    ));

    text.push_str("5. Relationship of the parties\n");
    text.push_str(
        "The contractor is self-employed and is not an employee of the client or the platform.\n",
    );
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TermsContext<'static> {
        TermsContext {
            job_id: Uuid::nil(),
            job_title: "Overnight companion",
            client_id: Uuid::nil(),
            nurse_id: Uuid::nil(),
            hourly_rate: Decimal::new(4800, 2),
            review_window_hours: 72,
            issued_on: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        }
    }

    #[test]
    fn every_care_type_has_a_template() {
        for care_type in CareType::ALL {
            let template = template_for(*care_type);
            let (min, max) = template.rate_guidance();
            assert!(min < max, "{}", care_type);
            assert!(!template.duties.is_empty());
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let template = template_for(CareType::Palliative);
        assert_eq!(render_terms(template, &ctx()), render_terms(template, &ctx()));
    }

    #[test]
    fn rendered_terms_carry_rate_and_window() {
        let text = render_terms(template_for(CareType::ElderlyCare), &ctx());
        assert!(text.starts_with("Elderly Care Services Agreement"));
        assert!(text.contains("Hourly rate: 48.00"));
        assert!(text.contains("35.00 - 55.00"));
        assert!(text.contains("72 hours"));
        assert!(text.contains("Issued: 2026-10-01"));
    }
}
