use crate::llm::Message;

/// domain rules the generator must follow for the invoice database
pub const SQL_CONVENTIONS: &str = "Important notes:\n\
     - The main tables are: documents, invoices, vendors, customers, payments, line_items\n\
     - Column names use camelCase (e.g., documentId, createdAt). ALWAYS wrap mixed-case identifiers in double quotes exactly as declared\n\
     - invoices, vendors, customers, payments and line_items each link to documents through the \"documentId\" column\n\
     - To combine invoice and vendor data, JOIN documents, invoices and vendors on \"documentId\"\n\
     - Dates are stored as timestamps\n\
     - Amounts may be negative (credits); use ABS() when computing totals\n\
     - Always use explicit JOIN conditions\n\n\
     Example: SELECT i.\"documentId\", i.\"invoiceTotal\" FROM invoices i";

pub const OUTPUT_RULES: &str = "Return exactly one executable PostgreSQL statement. \
     No explanation, no markdown, no code fences, no comments.";

/// system and user instructions for a single sql generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    pub system: String,
    pub user: String,
}

impl PromptPayload {
    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message::system(self.system.clone()),
            Message::user(self.user.clone()),
        ]
    }
}

pub fn compose(question: &str, schema_text: &str) -> PromptPayload {
    let system = format!(
        "You are an expert SQL query generator for a PostgreSQL database containing invoice and vendor data.\n\n\
         Database Schema:\n{}\n\n\
         {}\n\n\
         {}",
        schema_text.trim_end(),
        SQL_CONVENTIONS,
        OUTPUT_RULES
    );

    PromptPayload {
        system,
        user: question.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;

    const SCHEMA: &str = "Table: invoices\n  - id: uuid NOT NULL\n  - documentId: uuid NOT NULL\n  - invoiceTotal: numeric NULL";

    #[test]
    fn test_compose_is_deterministic() {
        assert_eq!(
            compose("Show me all invoices", SCHEMA),
            compose("Show me all invoices", SCHEMA)
        );
    }

    #[test]
    fn test_system_embeds_schema_and_conventions() {
        let payload = compose("Show me all invoices", SCHEMA);
        assert!(payload.system.contains("Table: invoices"));
        assert!(payload.system.contains("invoiceTotal: numeric NULL"));
        assert!(payload.system.contains("double quotes"));
        assert!(payload.system.contains("\"documentId\""));
        assert!(payload.system.contains("ABS()"));
        assert!(payload.system.contains("exactly one executable"));
    }

    #[test]
    fn test_user_is_literal_question() {
        let question = "  Top 5 vendors by spend?  ";
        let payload = compose(question, SCHEMA);
        assert_eq!(payload.user, question);
        assert!(!payload.system.contains("Top 5 vendors"));
    }

    #[test]
    fn test_messages_order() {
        let messages = compose("q", SCHEMA).messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[1].content, "q");
    }
}
