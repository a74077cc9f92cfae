use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "chefnet")]
#[command(about = "Browse ChefNet recipes and courses, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local data file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Backend base URL (overrides CHEFNET_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Never contact the backend
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in as a user
    Login {
        /// Backend user id
        user_id: String,
        /// Display name to store when the backend is unreachable
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget the signed-in user
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse and moderate recipes
    Recipes {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Browse courses and manage enrollment
    Courses {
        #[command(subcommand)]
        command: CourseCommands,
    },
    /// Manage your pending ("to cook") recipe list
    Pending {
        #[command(subcommand)]
        command: PendingCommands,
    },
    /// Record course attendance
    Attendance {
        #[command(subcommand)]
        command: AttendanceCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RecipeCommands {
    /// List every recipe
    List {
        /// Number of recipes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe with ingredients and steps
    Show {
        /// Recipe id
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search recipes by name or ingredient
    Search {
        /// Search query
        query: String,
        /// Match ingredient names instead of titles
        #[arg(long)]
        ingredient: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recipes authored by the signed-in user
    Mine {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Publish a recipe waiting for approval
    Approve {
        /// Recipe id
        id: String,
    },
    /// Delete a recipe
    Delete {
        /// Recipe id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CourseCommands {
    /// List every course
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one course with its sites and schedules
    Show {
        /// Course id
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Enroll the signed-in user
    Enroll {
        /// Course id
        id: String,
    },
    /// Cancel the signed-in user's enrollment
    Cancel {
        /// Course id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PendingCommands {
    /// Show the pending list
    List {
        /// Show the last fetched list without contacting the backend
        #[arg(long)]
        cached: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a recipe to the list
    Add {
        /// Recipe id
        id: String,
    },
    /// Remove a recipe from the list
    Remove {
        /// Recipe id
        id: String,
    },
    /// Mark a recipe as cooked
    Done {
        /// Recipe id
        id: String,
    },
    /// Mark a recipe as not cooked yet
    Undone {
        /// Recipe id
        id: String,
    },
    /// List recipe ids hidden after removal
    Tombstones,
    /// Allow removed recipes to reappear from the backend
    ClearTombstones,
}

#[derive(Subcommand)]
pub enum AttendanceCommands {
    /// Record attendance for a student in a course
    Record {
        /// Student id
        student_id: String,
        /// Course id
        course_id: String,
    },
    /// Retry attendance saved while offline
    Sync,
    /// Show attendance saved while offline
    Queue {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
