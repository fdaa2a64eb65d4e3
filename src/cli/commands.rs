use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gl", about = concat!("gl v", env!("CARGO_PKG_VERSION"), " - a grocery list you reorder by dragging"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create grocery/ with an empty list in the current directory
    Init(InitArgs),
    /// Show categories and their entries in order
    List,
    /// Add a category at the end of the category order
    AddCategory(AddCategoryArgs),
    /// Add an entry at the end of a category
    Add(AddArgs),
    /// Move an entry onto another entry's slot or into a category
    Mv(MvArgs),
    /// Move a category onto another category's slot
    MvCategory(MvCategoryArgs),
    /// Replay recorded drag events through the reorder engine
    Replay(ReplayArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Reinitialize even if grocery/list.json already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AddCategoryArgs {
    pub name: String,
}

#[derive(Args)]
pub struct AddArgs {
    pub description: String,
    /// Category id (default: Uncategorized)
    #[arg(long)]
    pub category: Option<i64>,
    /// Free-text amount, e.g. "2kg"
    #[arg(long)]
    pub quantity: Option<String>,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["onto", "into"])))]
pub struct MvArgs {
    /// Entry id
    pub id: i64,
    /// Take the slot of this entry
    #[arg(long)]
    pub onto: Option<i64>,
    /// Append to the end of this category
    #[arg(long)]
    pub into: Option<i64>,
}

#[derive(Args)]
pub struct MvCategoryArgs {
    /// Category id
    pub id: i64,
    /// Take the slot of this category
    #[arg(long)]
    pub onto: i64,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// JSON file with a list of drag events
    pub script: String,
}
