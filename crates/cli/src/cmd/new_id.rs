//! Print a freshly generated fork id

use anyhow::Result;

pub fn run(parent_id: Option<&str>) -> Result<()> {
    println!("{}", fy_core::generate_fork_id(parent_id));
    Ok(())
}
