use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Planning,
    Building,
    Marketing,
    Preparation,
    Launch,
    PostLaunch,
}

#[derive(Debug, Clone, Copy)]
pub struct LaunchTask {
    pub day: i32,
    pub title: &'static str,
    pub description: &'static str,
    pub category: TaskCategory,
}

const fn task(
    day: i32,
    title: &'static str,
    description: &'static str,
    category: TaskCategory,
) -> LaunchTask {
    LaunchTask {
        day,
        title,
        description,
        category,
    }
}

use TaskCategory::*;

/// The 30-day launch checklist, one task per day.
pub static LAUNCH_TASKS: [LaunchTask; 30] = [
    // planning and foundation
    task(
        1,
        "Define Your Value Proposition",
        "Clearly articulate what problem your SaaS solves and for whom. Write a one-sentence value proposition.",
        Planning,
    ),
    task(
        2,
        "Research Your Competition",
        "Identify 5-10 competitors. Analyze their pricing, features, and positioning. Find your unique angle.",
        Planning,
    ),
    task(
        3,
        "Set Your Pricing Strategy",
        "Use the Pricing Calculator to model different scenarios. Choose your pricing tiers and test messaging.",
        Planning,
    ),
    task(
        4,
        "Create Landing Page Wireframe",
        "Sketch or wireframe your landing page. Include hero section, features, pricing, and CTA.",
        Planning,
    ),
    task(
        5,
        "Build Your Email List Setup",
        "Set up email marketing tool (ConvertKit, Mailchimp, etc.). Create welcome email sequence.",
        Planning,
    ),
    // building and content
    task(
        6,
        "Launch Your Landing Page",
        "Build and deploy a simple landing page with email capture. Keep it minimal but clear.",
        Building,
    ),
    task(
        7,
        "Set Up Analytics",
        "Install Google Analytics, Plausible, or similar. Set up conversion tracking for signups.",
        Building,
    ),
    task(
        8,
        "Create Social Media Accounts",
        "Set up Twitter/X and LinkedIn accounts for your product. Complete profiles with clear branding.",
        Marketing,
    ),
    task(
        9,
        "Write Your First Blog Post",
        "Publish a problem-focused blog post related to your product. Optimize for SEO.",
        Marketing,
    ),
    task(
        10,
        "Build Your Beta Tester List",
        "Reach out to 20-30 people in your network. Offer early access in exchange for feedback.",
        Marketing,
    ),
    task(
        11,
        "Create Demo Video",
        "Record a 60-90 second product demo. Show the core value proposition clearly.",
        Building,
    ),
    task(
        12,
        "Prepare Customer Support",
        "Set up support email, help docs, or FAQ page. Define response time expectations.",
        Building,
    ),
    task(
        13,
        "Launch Beta to Testers",
        "Send beta access to your tester list. Set up feedback collection system.",
        Building,
    ),
    task(
        14,
        "Gather & Implement Feedback",
        "Review beta feedback. Fix critical bugs and implement quick wins.",
        Building,
    ),
    task(
        15,
        "Polish Your Product",
        "Final UI/UX improvements. Ensure onboarding is smooth. Test all critical paths.",
        Building,
    ),
    // pre-launch marketing
    task(
        16,
        "Create Social Proof Assets",
        "Collect testimonials from beta users. Create case studies or screenshots of results.",
        Marketing,
    ),
    task(
        17,
        "Build Your Launch Day Content",
        "Write social media posts, email announcements, and blog post for launch day.",
        Marketing,
    ),
    task(
        18,
        "Research Launch Channels",
        "List communities, subreddits, Facebook groups, and forums where your audience hangs out.",
        Marketing,
    ),
    task(
        19,
        "Create Launch Week Schedule",
        "Plan exactly when and where you'll announce. Schedule posts in advance where possible.",
        Preparation,
    ),
    task(
        20,
        "Start ProductHunt Preparation",
        "Create ProductHunt profile. Research successful launches. Draft your ProductHunt post.",
        Preparation,
    ),
    // producthunt prep
    task(
        21,
        "Finalize ProductHunt Assets",
        "Prepare logo, screenshots, demo video, and tagline. Write compelling description.",
        Preparation,
    ),
    task(
        22,
        "Find a ProductHunt Hunter",
        "Research and reach out to hunters in your space. Personalize outreach messages.",
        Preparation,
    ),
    task(
        23,
        "Build Launch Day Support Team",
        "Line up 10-20 people to upvote and comment on launch day. Brief them on timing.",
        Preparation,
    ),
    task(
        24,
        "Set Up Launch Day Monitoring",
        "Prepare to monitor ProductHunt, Twitter, email, and support. Clear your calendar.",
        Preparation,
    ),
    task(
        25,
        "Final Pre-Launch Check",
        "Test all systems. Verify payment flows, emails, and onboarding work perfectly.",
        Preparation,
    ),
    // launch
    task(
        26,
        "Launch on ProductHunt (12:01 AM PST)",
        "Go live on ProductHunt. Post immediately to social media. Engage with every comment.",
        Launch,
    ),
    task(
        27,
        "Launch Everywhere Else",
        "Post in communities, forums, and groups. Send email announcement. Share on LinkedIn/Twitter.",
        Launch,
    ),
    // post-launch
    task(
        28,
        "Collect Launch Feedback",
        "Reach out to new users. Send feedback survey. Identify quick wins and urgent bugs.",
        PostLaunch,
    ),
    task(
        29,
        "Analyze Launch Data",
        "Review analytics, conversion rates, and user behavior. What worked? What didn't?",
        PostLaunch,
    ),
    task(
        30,
        "Plan Next 30 Days",
        "Based on launch learnings, create plan for next month. Set growth goals and priorities.",
        PostLaunch,
    ),
];

pub fn find_task(day: i32) -> Option<&'static LaunchTask> {
    LAUNCH_TASKS.iter().find(|task| task.day == day)
}

/// Whole percent, 0 when there is nothing to complete.
pub fn progress_percentage(completed: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as i64
}
