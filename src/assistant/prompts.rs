//! Prompt templates.
//!
//! Every prompt is plain text. File listings use the same
//! `FILE:` / `DESCRIPTION:` / `DEPENDENCIES:` layout so the model sees one
//! consistent view of the repository.

use crate::graph::DependencyEdge;

/// Prompt for a short description stored on a graph node.
pub fn describe_file(path: &str, content: &str) -> String {
    format!(
        "Below is the content of a Terraform file named '{path}'.\n\
         Please provide a concise description (2-3 sentences) of what this file does, \
         what resources it creates, and its purpose in the infrastructure.\n\
         \n\
         ```terraform\n\
         {content}\n\
         ```\n"
    )
}

/// Prompt for the longer summary printed by `tfscope summarize`.
pub fn summarize_file(path: &str, content: &str) -> String {
    format!(
        "Below is the content of a Terraform file named '{path}'.\n\
         Please provide a detailed summary (3-5 sentences) of this file, covering:\n\
         1. The resources, data sources and modules it declares\n\
         2. The inputs it expects and the outputs it exposes\n\
         3. How it fits into the wider infrastructure\n\
         \n\
         ```terraform\n\
         {content}\n\
         ```\n"
    )
}

/// One entry of a file listing.
pub struct FileEntry<'a> {
    pub path: &'a str,
    pub description: &'a str,
    pub dependencies: Vec<(&'a str, &'a DependencyEdge)>,
}

impl FileEntry<'_> {
    fn render(&self, out: &mut String) {
        out.push_str(&format!("\nFILE: {}\nDESCRIPTION: {}\n", self.path, self.description));
        if !self.dependencies.is_empty() {
            let deps: Vec<String> = self
                .dependencies
                .iter()
                .map(|(target, edge)| format!("{target} ({}: {})", edge.kind, edge.module_name))
                .collect();
            out.push_str(&format!("DEPENDENCIES: {}\n", deps.join(", ")));
        }
    }
}

/// Prompt asking which files a request touches.
pub fn select_files(request: &str, files: &[FileEntry<'_>]) -> String {
    let mut prompt = format!(
        "I need to modify a Terraform codebase according to this request:\n\
         \n\
         MODIFICATION REQUEST: {request}\n\
         \n\
         Here are the files in the codebase with their descriptions and dependencies:\n"
    );
    for file in files {
        file.render(&mut prompt);
    }
    prompt.push_str(
        "\nPlease identify the files that need to be modified to implement the requested change.\n\
         Return your answer as a JSON array of file paths, like this: [\"path/to/file1.tf\", \"path/to/file2.tf\"]\n\
         Only include files that need to be modified, not files that are just referenced.\n",
    );
    prompt
}

/// Prompt asking for the complete rewritten content of one file.
pub fn modify_file(request: &str, file: &FileEntry<'_>, content: &str) -> String {
    let mut prompt = format!(
        "I need to modify a Terraform file according to this request:\n\
         \n\
         MODIFICATION REQUEST: {request}\n"
    );
    file.render(&mut prompt);
    prompt.push_str(&format!(
        "\nHere is the current content of the file:\n\
         \n\
         ```terraform\n\
         {content}\n\
         ```\n\
         \n\
         Please provide the modified version of the file that implements the requested change.\n\
         Return ONLY the complete modified file content, with no additional explanations.\n"
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;

    #[test]
    fn test_file_entry_with_dependencies() {
        let edge = DependencyEdge {
            kind: EdgeKind::ModuleDependency,
            module_name: "net".to_string(),
        };
        let entry = FileEntry {
            path: "main.tf",
            description: "Root module",
            dependencies: vec![("modules/net/main.tf", &edge)],
        };
        let prompt = select_files("add tags", &[entry]);
        assert!(prompt.contains("MODIFICATION REQUEST: add tags"));
        assert!(prompt.contains(
            "\nFILE: main.tf\nDESCRIPTION: Root module\nDEPENDENCIES: modules/net/main.tf (module_dependency: net)\n"
        ));
        assert!(prompt.contains("JSON array of file paths"));
    }

    #[test]
    fn test_modify_prompt_fences_content() {
        let entry = FileEntry {
            path: "vars.tf",
            description: "Variables",
            dependencies: Vec::new(),
        };
        let prompt = modify_file("rename x", &entry, "variable \"x\" {}");
        assert!(!prompt.contains("DEPENDENCIES:"));
        assert!(prompt.contains("```terraform\nvariable \"x\" {}\n```"));
        assert!(prompt.contains("Return ONLY the complete modified file content"));
    }

    #[test]
    fn test_describe_prompt_names_file() {
        let prompt = describe_file("main.tf", "locals {}");
        assert!(prompt.contains("'main.tf'"));
        assert!(prompt.contains("2-3 sentences"));
    }
}
