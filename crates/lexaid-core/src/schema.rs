/// Arrow schema definitions for the legal corpus tables.
pub mod corpus {
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    /// Embedding dimensionality used across all embedded tables.
    pub const EMBED_DIM: i32 = 1536;

    fn embedding_field() -> Field {
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                EMBED_DIM,
            ),
            true,
        )
    }

    fn string_list_field(name: &str) -> Field {
        Field::new(
            name,
            DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
            false,
        )
    }

    /// Schema for the `legal_sections` table.
    pub fn legal_sections_schema() -> Schema {
        Schema::new(vec![
            Field::new("document_type", DataType::Utf8, false),
            Field::new("citation", DataType::Utf8, false),
            Field::new("section_number", DataType::Utf8, false),
            Field::new("section_title", DataType::Utf8, false),
            Field::new("section_text", DataType::Utf8, false),
            embedding_field(),
        ])
    }

    /// Schema for the `case_law` table.
    pub fn case_law_schema() -> Schema {
        Schema::new(vec![
            Field::new("case_name", DataType::Utf8, false),
            Field::new("citation", DataType::Utf8, false),
            Field::new("court", DataType::Utf8, false),
            Field::new("decided_date", DataType::Utf8, false),
            Field::new("facts_summary", DataType::Utf8, false),
            Field::new("issues", DataType::Utf8, false),
            Field::new("holdings", DataType::Utf8, false),
            Field::new("ratio_decidendi", DataType::Utf8, false),
            string_list_field("sections_interpreted"),
            embedding_field(),
        ])
    }

    /// Schema for the `playbooks` table.
    pub fn playbooks_schema() -> Schema {
        Schema::new(vec![
            Field::new("title", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("scenario", DataType::Utf8, false),
            Field::new("recommended_approach", DataType::Utf8, false),
            string_list_field("do_list"),
            string_list_field("dont_list"),
            string_list_field("legal_references"),
            Field::new("difficulty_level", DataType::Utf8, false),
            embedding_field(),
        ])
    }

    /// Schema for the `templates` table. No embedding column; templates are
    /// reached by exact lookup only.
    pub fn templates_schema() -> Schema {
        Schema::new(vec![
            Field::new("template_type", DataType::Utf8, false),
            Field::new("version", DataType::Int32, false),
            Field::new("is_active", DataType::Boolean, false),
            Field::new("content", DataType::Utf8, false),
        ])
    }
}
