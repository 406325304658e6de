//! `emberclaw skills` — list the installed skill catalog.

use emberclaw_config::AppConfig;
use emberclaw_core::skill::SkillRegistry;
use emberclaw_skills::DirSkillRegistry;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry = DirSkillRegistry::new(&config.skills.root);

    let catalog = registry.catalog().await;
    if catalog.is_empty() {
        println!();
        println!("  No skills installed.");
        println!();
        println!("  Install one by creating a directory with a SKILL.md file:");
        println!("    {}/<skill_name>/SKILL.md", config.skills.root.display());
        println!();
        return Ok(());
    }

    println!();
    println!("  Installed skills ({}):", catalog.len());
    println!();
    for skill in catalog {
        if skill.description.is_empty() {
            println!("  - {}", skill.id);
        } else {
            println!("  - {} — {}", skill.id, skill.description);
        }
    }
    println!();
    println!("  Activate one in chat with: activate_skill(<name>)");
    println!();

    Ok(())
}
