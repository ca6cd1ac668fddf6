text_enum! {
    /// Events handed to the notification and payment collaborators.
    pub enum LifecycleEvent {
        ApplicationSubmitted => "application_submitted",
        ApplicationHired => "application_hired",
        ApplicationDeclined => "application_declined",
        JobCancelled => "job_cancelled",
        ContractIssued => "contract_issued",
        ContractAccepted => "contract_accepted",
        ContractCompleted => "contract_completed",
        TimecardSubmitted => "timecard_submitted",
        TimecardApproved => "timecard_approved",
        TimecardRejected => "timecard_rejected",
        TimecardAutoApproved => "timecard_auto_approved",
        TimecardPaid => "timecard_paid",
        PayoutAuthorized => "payout_authorized",
    }
}
