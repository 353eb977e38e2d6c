//! Workflow template catalog: phase configuration, default subtask
//! checklists, and milestone schedules per event type.
//!
//! Everything here is immutable catalog data. Phase weights must sum to 100
//! across all phases; the aggregator divides by the observed total as a
//! drift guard, but the canonical weights are 10/25/25/20/15/5.

use chrono::{DateTime, Duration, Utc};

use crate::model::{MilestoneType, Phase, Priority};

/// Days before the event date that every stage's due date is set to at
/// workflow initialization.
pub const STAGE_DUE_BUFFER_DAYS: i64 = 7;

/// Static configuration for one phase.
#[derive(Debug, Clone, Copy)]
pub struct PhaseConfig {
    pub phase: Phase,
    pub name: &'static str,
    pub description: &'static str,
    /// Relative weight in the overall progress aggregation.
    pub weight: u32,
    pub color: &'static str,
    pub icon: &'static str,
    pub typical_duration_days: u32,
    pub order: i64,
}

const PHASE_CONFIGS: [PhaseConfig; 6] = [
    PhaseConfig {
        phase: Phase::Ideation,
        name: "Ideation & Planning",
        description: "Define event concept, goals, and initial planning",
        weight: 10,
        color: "#8B5CF6",
        icon: "\u{1F4A1}",
        typical_duration_days: 14,
        order: 1,
    },
    PhaseConfig {
        phase: Phase::Logistics,
        name: "Logistics & Speakers",
        description: "Book venue, confirm speakers, arrange logistics",
        weight: 25,
        color: "#3B82F6",
        icon: "\u{1F4C5}",
        typical_duration_days: 30,
        order: 2,
    },
    PhaseConfig {
        phase: Phase::Marketing,
        name: "Marketing & Promotion",
        description: "Create brand, launch campaigns, drive registrations",
        weight: 25,
        color: "#F59E0B",
        icon: "\u{1F4E2}",
        typical_duration_days: 35,
        order: 3,
    },
    PhaseConfig {
        phase: Phase::Preparation,
        name: "Final Preparation",
        description: "Finalize materials, rehearse, prepare for event",
        weight: 20,
        color: "#F97316",
        icon: "\u{2705}",
        typical_duration_days: 14,
        order: 4,
    },
    PhaseConfig {
        phase: Phase::Execution,
        name: "Event Execution",
        description: "Run the event successfully",
        weight: 15,
        color: "#22C55E",
        icon: "\u{1F389}",
        typical_duration_days: 1,
        order: 5,
    },
    PhaseConfig {
        phase: Phase::Review,
        name: "Post-Event Review",
        description: "Gather feedback, analyze metrics, document learnings",
        weight: 5,
        color: "#6B7280",
        icon: "\u{1F4CA}",
        typical_duration_days: 7,
        order: 6,
    },
];

/// Look up the static configuration for a phase.
pub fn phase_config(phase: Phase) -> &'static PhaseConfig {
    &PHASE_CONFIGS[phase.index()]
}

/// All phase configurations in canonical order.
pub fn phase_configs() -> &'static [PhaseConfig; 6] {
    &PHASE_CONFIGS
}

/// One entry in a phase's default checklist.
#[derive(Debug, Clone, Copy)]
pub struct SubtaskTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub priority: Priority,
    pub estimated_hours: f64,
    pub order: i64,
}

const fn st(
    title: &'static str,
    description: &'static str,
    category: &'static str,
    priority: Priority,
    estimated_hours: f64,
    order: i64,
) -> SubtaskTemplate {
    SubtaskTemplate {
        title,
        description,
        category,
        priority,
        estimated_hours,
        order,
    }
}

const IDEATION_SUBTASKS: [SubtaskTemplate; 8] = [
    st("Define Event Concept & Vision", "Write a clear event vision statement and key objectives", "concept", Priority::Critical, 4.0, 1),
    st("Identify Target Audience", "Define attendee personas, experience level, interests", "audience", Priority::High, 3.0, 2),
    st("Set Budget Framework", "Estimate costs for venue, food, speakers, marketing", "budget", Priority::High, 4.0, 3),
    st("Determine Event Format", "Choose in-person, virtual, or hybrid format", "logistics", Priority::Critical, 2.0, 4),
    st("Select Potential Dates", "Identify 3-5 potential dates avoiding conflicts", "logistics", Priority::High, 2.0, 5),
    st("Define Success Metrics", "Set KPIs: attendance, engagement, satisfaction score", "metrics", Priority::High, 3.0, 6),
    st("Form Planning Team", "Identify and recruit core team members", "team", Priority::High, 3.0, 7),
    st("Research Similar Events", "Analyze 3-5 similar events for best practices", "research", Priority::Medium, 4.0, 8),
];

const LOGISTICS_SUBTASKS: [SubtaskTemplate; 13] = [
    st("Create Venue Requirements List", "Capacity, AV needs, accessibility, parking, amenities", "venue", Priority::Critical, 2.0, 1),
    st("Research & Shortlist Venues", "Find 5-7 venues matching requirements", "venue", Priority::Critical, 6.0, 2),
    st("Schedule Venue Tours", "Book and complete tours of top 3 venues", "venue", Priority::High, 4.0, 3),
    st("Negotiate & Book Venue", "Finalize contract, deposit, and confirm booking", "venue", Priority::Critical, 4.0, 4),
    st("Define Speaker Criteria", "Experience, topics, diversity, availability", "speakers", Priority::High, 2.0, 5),
    st("Research & Identify Speakers", "Create target list of 10-15 potential speakers", "speakers", Priority::High, 8.0, 6),
    st("Create Speaker Outreach Plan", "Draft emails, timeline, and follow-up strategy", "speakers", Priority::High, 3.0, 7),
    st("Send Speaker Invitations", "Send personalized invitations to top choices", "speakers", Priority::High, 4.0, 8),
    st("Create Speaker Agreement Template", "Define compensation, travel, content rights", "speakers", Priority::Medium, 3.0, 9),
    st("Finalize Speaker Lineup", "Confirm all speakers and collect bios/photos", "speakers", Priority::Critical, 4.0, 10),
    st("Arrange AV & Technical Needs", "Confirm projectors, microphones, streaming setup", "technical", Priority::High, 3.0, 11),
    st("Arrange Catering", "Menu selection, dietary restrictions, delivery", "catering", Priority::Medium, 4.0, 12),
    st("Plan Registration Process", "Create registration flow, confirm attendee limits", "registration", Priority::High, 3.0, 13),
];

const MARKETING_SUBTASKS: [SubtaskTemplate; 14] = [
    st("Develop Event Brand Identity", "Logo, color scheme, fonts, visual style", "branding", Priority::Critical, 8.0, 1),
    st("Write Event Copy", "Description, tagline, key selling points", "content", Priority::Critical, 4.0, 2),
    st("Generate Promotional Event Image", "Create promotional image for campaigns", "branding", Priority::High, 1.0, 3),
    st("Create Landing Page", "Design and build event registration page", "website", Priority::Critical, 8.0, 4),
    st("Set Up Registration System", "Configure ticket types, pricing tiers, limits", "website", Priority::Critical, 4.0, 5),
    st("Create Social Media Strategy", "Platforms, content calendar, posting schedule", "social", Priority::High, 4.0, 6),
    st("Design Social Media Assets", "Create graphics for all platforms", "social", Priority::High, 8.0, 7),
    st("Create Email Campaign Sequence", "Write 5-7 emails for announcement, reminders", "email", Priority::High, 8.0, 8),
    st("Set Up Email Automation", "Configure drip campaigns and triggers", "email", Priority::High, 4.0, 9),
    st("Create Press Release", "Write and distribute press announcement", "pr", Priority::Medium, 4.0, 10),
    st("Reach Out to Partners", "Contact sponsors, community partners for promotion", "partners", Priority::High, 4.0, 11),
    st("Create Speaker Promotion Kit", "Social posts, email templates for speakers", "social", Priority::Medium, 3.0, 12),
    st("Launch Early Bird Campaign", "Open registration with early bird pricing", "campaign", Priority::Critical, 2.0, 13),
    st("Schedule Social Media Posts", "Load all posts into scheduling tool", "social", Priority::High, 4.0, 14),
];

const PREPARATION_SUBTASKS: [SubtaskTemplate; 14] = [
    st("Final Speaker Communications", "Send logistics, AV requirements, schedule", "speakers", Priority::Critical, 4.0, 1),
    st("Collect Speaker Materials", "Bios, photos, slide decks, videos", "content", Priority::High, 4.0, 2),
    st("Review & Test AV Equipment", "Full rehearsal with all technical setup", "technical", Priority::Critical, 4.0, 3),
    st("Create Event Schedule", "Detailed timeline with buffer times", "logistics", Priority::Critical, 4.0, 4),
    st("Prepare Speaker Briefings", "Timelines, logistics, Q&A expectations", "speakers", Priority::High, 4.0, 5),
    st("Create Attendee Guide", "Venue info, schedule, tips, WiFi passwords", "content", Priority::High, 4.0, 6),
    st("Print Signage & Materials", "Direction signs, name tags, agendas", "materials", Priority::Medium, 3.0, 7),
    st("Confirm Catering Order", "Final headcount, delivery time, setup", "catering", Priority::High, 2.0, 8),
    st("Train Registration Volunteers", "Process walkthrough, troubleshooting", "volunteers", Priority::High, 3.0, 9),
    st("Prepare Emergency Contacts List", "Venue staff, tech support, medical", "safety", Priority::High, 1.0, 10),
    st("Set Up Event Check-in System", "QR codes, badge printing, check-in app", "registration", Priority::Critical, 3.0, 11),
    st("Final Marketing Push", "Last social posts, reminder emails", "marketing", Priority::High, 4.0, 12),
    st("Print Final Attendee List", "Backup registration list", "registration", Priority::Medium, 1.0, 13),
    st("Pack Event Kit", "Laptop, dongles, backup cables, swag", "materials", Priority::High, 2.0, 14),
];

const EXECUTION_SUBTASKS: [SubtaskTemplate; 15] = [
    st("Arrive Early & Set Up", "Venue access, unpack, equipment setup", "setup", Priority::Critical, 3.0, 1),
    st("Test All AV Systems", "Projector, microphone, livestream, recordings", "technical", Priority::Critical, 1.0, 2),
    st("Set Up Registration Desk", "Check-in stations, badge printing, signs", "registration", Priority::Critical, 1.0, 3),
    st("Brief All Staff & Volunteers", "Roles, schedule, communication plan", "team", Priority::Critical, 0.5, 4),
    st("Manage Check-in Process", "Greet attendees, troubleshoot issues", "registration", Priority::High, 4.0, 5),
    st("Facilitate Opening", "Welcome remarks, housekeeping, WiFi info", "program", Priority::High, 0.5, 6),
    st("Monitor Session Flow", "Track time, handle issues, assist speakers", "program", Priority::Critical, 6.0, 7),
    st("Manage Break Logistics", "Coffee, food, room reset", "logistics", Priority::High, 2.0, 8),
    st("Capture Photos & Video", "Document key moments, speaker sessions", "media", Priority::High, 6.0, 9),
    st("Moderate Q&A Sessions", "Collect questions, facilitate discussion", "program", Priority::Medium, 3.0, 10),
    st("Handle Real-time Issues", "Technical problems, attendee concerns", "troubleshooting", Priority::High, 4.0, 11),
    st("Manage Networking Session", "Facilitate connections, timekeeper", "program", Priority::Medium, 2.0, 12),
    st("Collect Feedback Cards", "Physical feedback forms", "feedback", Priority::High, 1.0, 13),
    st("Close & Thank Attendees", "Closing remarks, next event announcement", "program", Priority::High, 0.5, 14),
    st("Clean Up & Pack Out", "Collect materials, equipment, trash", "setup", Priority::High, 2.0, 15),
];

const REVIEW_SUBTASKS: [SubtaskTemplate; 14] = [
    st("Send Thank You Emails", "Attendees, speakers, sponsors, volunteers", "communication", Priority::High, 2.0, 1),
    st("Upload Session Recordings", "Edit and publish video content", "content", Priority::High, 8.0, 2),
    st("Process Survey Responses", "Analyze feedback forms and ratings", "feedback", Priority::High, 4.0, 3),
    st("Calculate Success Metrics", "Attendance rate, NPS, engagement scores", "metrics", Priority::Critical, 3.0, 4),
    st("Compare to Baseline Goals", "Did we meet our KPIs? Analysis", "metrics", Priority::High, 2.0, 5),
    st("Conduct Team Retrospective", "What went well, what to improve", "review", Priority::High, 3.0, 6),
    st("Document Lessons Learned", "Create report for future events", "documentation", Priority::High, 4.0, 7),
    st("Process Expense Reimbursements", "Collect and approve receipts", "budget", Priority::Medium, 2.0, 8),
    st("Final Budget Reconciliation", "Compare actual vs budgeted costs", "budget", Priority::High, 2.0, 9),
    st("Share Highlights Content", "Photos, key moments on social media", "marketing", Priority::High, 4.0, 10),
    st("Update Speaker Database", "Ratings, notes for future outreach", "speakers", Priority::Medium, 2.0, 11),
    st("Archive Event Materials", "Presentations, photos, assets for future use", "documentation", Priority::Medium, 3.0, 12),
    st("Plan Follow-up Content", "Blog posts, newsletters about event", "content", Priority::Medium, 4.0, 13),
    st("Begin Planning Next Event", "Initial ideas based on feedback", "planning", Priority::Low, 2.0, 14),
];

/// Default checklist for a phase, in template order.
pub fn subtask_templates(phase: Phase) -> &'static [SubtaskTemplate] {
    match phase {
        Phase::Ideation => &IDEATION_SUBTASKS,
        Phase::Logistics => &LOGISTICS_SUBTASKS,
        Phase::Marketing => &MARKETING_SUBTASKS,
        Phase::Preparation => &PREPARATION_SUBTASKS,
        Phase::Execution => &EXECUTION_SUBTASKS,
        Phase::Review => &REVIEW_SUBTASKS,
    }
}

/// One scheduled checkpoint in an event-type template. `days_before_event`
/// may be negative, yielding a due date after the event.
#[derive(Debug, Clone, Copy)]
pub struct MilestoneTemplate {
    pub title: &'static str,
    pub milestone_type: MilestoneType,
    pub days_before_event: i64,
    pub is_critical: bool,
}

const fn mt(
    title: &'static str,
    milestone_type: MilestoneType,
    days_before_event: i64,
    is_critical: bool,
) -> MilestoneTemplate {
    MilestoneTemplate {
        title,
        milestone_type,
        days_before_event,
        is_critical,
    }
}

const MEETUP_MILESTONES: [MilestoneTemplate; 12] = [
    mt("Event Concept Finalized", MilestoneType::Deliverable, 60, true),
    mt("Venue Booked", MilestoneType::Deadline, 45, true),
    mt("First Speaker Confirmed", MilestoneType::Deliverable, 35, false),
    mt("Registration Opens", MilestoneType::Deadline, 30, true),
    mt("Website Live", MilestoneType::Deliverable, 28, true),
    mt("Speaker Deck Due", MilestoneType::Deadline, 14, false),
    mt("Marketing Campaign Launch", MilestoneType::Deliverable, 21, false),
    mt("Registration Deadline", MilestoneType::Deadline, 7, true),
    mt("Final Run-through", MilestoneType::Deliverable, 3, false),
    mt("Event Day", MilestoneType::Event, 0, true),
    mt("Feedback Survey Sent", MilestoneType::Deadline, -1, false),
    mt("Event Report Complete", MilestoneType::Deliverable, -7, false),
];

const WORKSHOP_MILESTONES: [MilestoneTemplate; 9] = [
    mt("Curriculum Finalized", MilestoneType::Deliverable, 45, true),
    mt("Venue & Date Confirmed", MilestoneType::Deadline, 40, true),
    mt("Instructor Contracts Signed", MilestoneType::Deliverable, 35, true),
    mt("Registration Opens", MilestoneType::Deadline, 30, true),
    mt("Course Materials Draft", MilestoneType::Deliverable, 21, false),
    mt("Registration Deadline", MilestoneType::Deadline, 7, true),
    mt("Final Materials Ready", MilestoneType::Deliverable, 5, true),
    mt("Event Day", MilestoneType::Event, 0, true),
    mt("Certificates Issued", MilestoneType::Deliverable, -3, false),
];

const CONFERENCE_MILESTONES: [MilestoneTemplate; 11] = [
    mt("Conference Theme & Scope Defined", MilestoneType::Deliverable, 120, true),
    mt("Keynote Speakers Secured", MilestoneType::Deliverable, 90, true),
    mt("Venue Contract Signed", MilestoneType::Deadline, 90, true),
    mt("Call for Proposals Open", MilestoneType::Deadline, 75, false),
    mt("Early Bird Registration", MilestoneType::Deadline, 60, true),
    mt("CFP Deadline", MilestoneType::Deadline, 45, true),
    mt("Speaker Schedule Published", MilestoneType::Deliverable, 30, true),
    mt("Regular Registration Closes", MilestoneType::Deadline, 14, true),
    mt("Final AV Checklist", MilestoneType::Deliverable, 7, false),
    mt("Conference Day 1", MilestoneType::Event, 0, true),
    mt("Post-Conference Report", MilestoneType::Deliverable, -14, false),
];

/// Milestone schedule for an event type. Unknown types fall back to the
/// `meetup` template; this is a documented fallback, not an error.
pub fn milestone_templates(event_type: &str) -> &'static [MilestoneTemplate] {
    match event_type {
        "workshop" => &WORKSHOP_MILESTONES,
        "conference" => &CONFERENCE_MILESTONES,
        _ => &MEETUP_MILESTONES,
    }
}

/// A milestone ready for insertion, materialized from a template entry.
#[derive(Debug, Clone)]
pub struct MilestoneSeed {
    pub title: String,
    pub description: String,
    pub milestone_type: MilestoneType,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    pub is_critical: bool,
    pub impact_description: String,
    pub order: i64,
}

/// Generate the milestone list for an event type, dated relative to the
/// event's scheduled date.
pub fn generate_milestones(event_type: &str, event_date: DateTime<Utc>) -> Vec<MilestoneSeed> {
    milestone_templates(event_type)
        .iter()
        .enumerate()
        .map(|(i, tpl)| MilestoneSeed {
            title: tpl.title.to_string(),
            description: format!("Milestone: {}", tpl.title),
            milestone_type: tpl.milestone_type,
            due_date: event_date - Duration::days(tpl.days_before_event),
            is_completed: false,
            is_critical: tpl.is_critical,
            impact_description: format!(
                "Missing this milestone could impact {}",
                tpl.title.to_lowercase()
            ),
            order: i as i64,
        })
        .collect()
}
