//! Plain-text script rendering: a read-only document derived from the
//! project (title, then per scene: id, characters, mood, body text).
//! Page layout is left to downstream consumers.

use crate::project::ProjectData;

const SEPARATOR: &str = "----------------------------------------";

/// Render the project as a director's script.
pub fn render_script(project: &ProjectData) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(project.title.clone());
    lines.push(SEPARATOR.to_string());

    for scene in &project.scenes {
        lines.push(String::new());
        lines.push(format!("SCENE {}", scene.id));
        let characters = if scene.characters.is_empty() {
            "None".to_string()
        } else {
            scene.characters.join(", ")
        };
        lines.push(format!("CHARACTERS: {characters}"));
        lines.push(format!("MOOD: {}", scene.mood));
        lines.push(String::new());
        lines.push(scene.text.clone());
        lines.push(String::new());
        lines.push(SEPARATOR.to_string());
    }

    lines.join("\n")
}
