//! Language registry: maps a language id to the Piston runtime it runs on.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    /// Language name understood by the execution service.
    pub service_language: &'static str,
    pub service_version: &'static str,
    pub default_code: &'static str,
}

pub const FALLBACK_LANGUAGE: &str = "javascript";

static LANGUAGES: &[RuntimeDescriptor] = &[
    RuntimeDescriptor {
        id: "javascript",
        label: "JavaScript",
        service_language: "javascript",
        service_version: "18.15.0",
        default_code: "console.log(\"Hello, world!\");\n",
    },
    RuntimeDescriptor {
        id: "typescript",
        label: "TypeScript",
        service_language: "typescript",
        service_version: "5.0.3",
        default_code: "const greeting: string = \"Hello, world!\";\nconsole.log(greeting);\n",
    },
    RuntimeDescriptor {
        id: "python",
        label: "Python",
        service_language: "python",
        service_version: "3.10.0",
        default_code: "print(\"Hello, world!\")\n",
    },
    RuntimeDescriptor {
        id: "java",
        label: "Java",
        service_language: "java",
        service_version: "15.0.2",
        default_code: "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, world!\");\n    }\n}\n",
    },
    RuntimeDescriptor {
        id: "go",
        label: "Go",
        service_language: "go",
        service_version: "1.16.2",
        default_code: "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"Hello, world!\")\n}\n",
    },
    RuntimeDescriptor {
        id: "rust",
        label: "Rust",
        service_language: "rust",
        service_version: "1.68.2",
        default_code: "fn main() {\n    println!(\"Hello, world!\");\n}\n",
    },
    RuntimeDescriptor {
        id: "cpp",
        label: "C++",
        service_language: "cpp",
        service_version: "10.2.0",
        default_code: "#include <iostream>\n\nint main() {\n    std::cout << \"Hello, world!\" << std::endl;\n    return 0;\n}\n",
    },
    RuntimeDescriptor {
        id: "csharp",
        label: "C#",
        service_language: "csharp",
        service_version: "6.12.0",
        default_code: "using System;\n\nclass Program {\n    static void Main() {\n        Console.WriteLine(\"Hello, world!\");\n    }\n}\n",
    },
    RuntimeDescriptor {
        id: "ruby",
        label: "Ruby",
        service_language: "ruby",
        service_version: "3.0.1",
        default_code: "puts \"Hello, world!\"\n",
    },
    RuntimeDescriptor {
        id: "swift",
        label: "Swift",
        service_language: "swift",
        service_version: "5.3.3",
        default_code: "print(\"Hello, world!\")\n",
    },
];

pub fn lookup(language: &str) -> Result<&'static RuntimeDescriptor> {
    LANGUAGES
        .iter()
        .find(|d| d.id == language)
        .ok_or_else(|| Error::UnknownLanguage(language.to_string()))
}

pub fn is_registered(language: &str) -> bool {
    lookup(language).is_ok()
}

pub fn all() -> &'static [RuntimeDescriptor] {
    LANGUAGES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_language() {
        let d = lookup("python").unwrap();
        assert_eq!(d.service_language, "python");
        assert_eq!(d.service_version, "3.10.0");
    }

    #[test]
    fn lookup_unknown_language() {
        match lookup("cobol") {
            Err(Error::UnknownLanguage(id)) => assert_eq!(id, "cobol"),
            other => panic!("unexpected: {:?}", other),
        }
        // ids are case sensitive
        assert!(!is_registered("Python"));
    }

    #[test]
    fn ids_are_unique_and_fallback_registered() {
        let mut ids: Vec<_> = all().iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), all().len());
        assert!(is_registered(FALLBACK_LANGUAGE));
    }
}
