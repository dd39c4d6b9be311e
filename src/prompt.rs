//! Language-aware prompt assembly.
//!
//! The generation prompt is parametrized by a response language: each
//! supported language carries its own instruction line and an example
//! question/answer pair. Unknown language tags fall back to Indonesian.

use crate::models::RetrievedInformation;

/// Supported response languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Indonesia,
    Suroboyoan,
    English,
}

impl Language {
    /// Parses a language tag, returning `None` for unknown tags.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "Indonesia" => Some(Language::Indonesia),
            "Suroboyoan" => Some(Language::Suroboyoan),
            "English" => Some(Language::English),
            _ => None,
        }
    }

    /// Parses a language tag, falling back to the default language.
    pub fn parse_or_default(tag: &str) -> Self {
        Self::parse(tag).unwrap_or_default()
    }
}

/// Prompt content configured per language.
#[derive(Debug, PartialEq, Eq)]
pub struct LanguageConfig {
    pub name: &'static str,
    pub instruction: &'static str,
    pub example_question: &'static str,
    pub example_answer: &'static str,
}

const INDONESIA: LanguageConfig = LanguageConfig {
    name: "Indonesian",
    instruction: "Respond in Indonesian (Bahasa Indonesia)",
    example_question:
        "Apa persyaratan untuk mendaftar jalur mandiri di UPN Veteran Jawa Timur?",
    example_answer:
        "Untuk mendaftar jalur mandiri di UPN Veteran Jawa Timur, calon mahasiswa harus melengkapi beberapa persyaratan, seperti:",
};

const SUROBOYOAN: LanguageConfig = LanguageConfig {
    name: "Suroboyoan",
    instruction: "Respond in Javanese (Suroboyoan dialect)",
    example_question:
        "Opo syarate gawe ndaftar jalur mandiri nang UPN Veteran Jawa Timur?",
    example_answer:
        "Gawe ndaftar jalur mandiri nang UPN Veteran Jawa Timur, calon mahasiswa kudu ngelengkapi beberapa persyaratan, koyok:",
};

const ENGLISH: LanguageConfig = LanguageConfig {
    name: "English",
    instruction: "Respond in English",
    example_question:
        "What are the requirements for registering for the independent pathway at UPN Veteran Jawa Timur?",
    example_answer:
        "To register for the independent pathway at UPN Veteran Jawa Timur, prospective students must meet several requirements, including:",
};

/// Returns the prompt content for a language.
pub fn language_config(language: Language) -> &'static LanguageConfig {
    match language {
        Language::Indonesia => &INDONESIA,
        Language::Suroboyoan => &SUROBOYOAN,
        Language::English => &ENGLISH,
    }
}

/// Builds the generation system prompt for a language.
pub fn system_prompt(language: Language) -> String {
    let config = language_config(language);
    format!(
        r#"
You are an AI assistant tasked with answering questions regarding the New Student Admissions (PPMB) at UPN "Veteran" Jawa Timur.

You will be provided with a question, context, and context metadata to answer the question.

**IMPORTANT: {instruction}. All responses must be in {name}.**

**Steps you must follow:**

1.  **Analyze Context:** Examine each document in the context and identify whether it contains the answer to the question. Assign a relevance score to each document based on how closely it relates to the question.
2.  **Prioritize Documents:** Order the documents by relevance score, with the most relevant documents at the beginning. Ignore documents that are not relevant to the question.
3.  **Create a Summary:** Based on the most relevant documents, create a general summary of the question's topic.
4.  **Provide the Answer:** Give a specific and detailed answer, supported by information from the relevant documents. Ensure your explanation is at least 100 words and is written in {name}.
5.  **Information Limitations:** If the answer cannot be found in the provided context, clearly state that you do not have enough information to answer the question.
6.  **Answer Formatting:**
    *   Do not mention the process you followed to get the answer; just provide the answer directly.
    *   You can use Markdown formatting for your answer.
    *   Include the URLs of the source documents you used to answer the question at the end of the answer.

**Example:**
**Question:** {example_question}
**Answer:**
{example_answer}
... (more detailed explanation of at least 100 words) ...

Related sources:
[Document Name](Source document URL)
[Document Name](Source document URL)
...
"#,
        instruction = config.instruction,
        name = config.name,
        example_question = config.example_question,
        example_answer = config.example_answer,
    )
}

/// Builds the generation user prompt from the query and retrieval result.
///
/// Embeds the full document and metadata sequences; token budgeting is
/// handled upstream by the retrieval count and chunk size configuration.
pub fn user_prompt(query: &str, retrieved: &RetrievedInformation) -> String {
    let context = retrieved.documents.join("\n\n");
    let metadata = serde_json::to_string_pretty(&retrieved.metadatas)
        .unwrap_or_else(|_| "[]".to_string());

    format!(
        "\nContext:\n{context}\n\nMetadata:\n{metadata}\n\nOriginal Query: {query}\n"
    )
}
