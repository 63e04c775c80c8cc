//! Conversation assembly for the portfolio assistant.

/// Persona sent as the opening user turn of every conversation.
pub const DEFAULT_PERSONA: &str = "\
Você é o assistente virtual do Gabriel Mendes, um desenvolvedor Full-Stack especializado em automação com IA.

INFORMAÇÕES SOBRE O GABRIEL:
- Desenvolvedor Full-Stack com foco em React, Next.js, Node.js, TypeScript, PostgreSQL e MySQL
- Especialista em automação com IA (Claude, GPT, Gemini)
- Oferece serviços de: Desenvolvimento Web, Aplicações SaaS, Automação com IA, MVPs para Startups, Manutenção de Sites e Resolução de Bugs
- Contato: gabri.mevial@gmail.com | WhatsApp: (31) 99977-9157
- LinkedIn: linkedin.com/in/gabriel-mendes18 | GitHub: github.com/GMendes18

PROJETOS DESTAQUE:
- Financy Dashboard: Sistema de gestão financeira com análise de gastos com IA, cotação de moedas em tempo real

SEU COMPORTAMENTO:
- Seja simpático, profissional e objetivo
- Responda em português brasileiro
- Se perguntarem sobre preços, diga que os valores são combinados de acordo com a complexidade do projeto e sugira entrar em contato
- Se perguntarem algo que você não sabe sobre o Gabriel, sugira entrar em contato diretamente
- Mantenha respostas curtas (máximo 3 frases) a menos que peçam detalhes
- Sempre tente direcionar para um contato ou ação";

/// Canned model turn acknowledging the persona.
pub const ACKNOWLEDGEMENT: &str =
    "Entendido! Sou o assistente do Gabriel Mendes e estou pronto para ajudar.";

/// Reply used when the model answers without any text.
pub const FALLBACK_REPLY: &str =
    "Desculpe, não consegui processar sua mensagem. Tente novamente.";

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parse a client-supplied role tag. Unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "user" => Some(Role::User),
            "assistant" | "model" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// One role-tagged turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Assemble the full upstream conversation.
///
/// Order: persona (user), acknowledgement (assistant), prior history, then
/// the new user message.
pub fn build_conversation(
    persona: &str,
    history: Vec<ChatMessage>,
    message: &str,
) -> Vec<ChatMessage> {
    let mut turns = Vec::with_capacity(history.len() + 3);
    turns.push(ChatMessage::user(persona));
    turns.push(ChatMessage::assistant(ACKNOWLEDGEMENT));
    turns.extend(history);
    turns.push(ChatMessage::user(message));
    turns
}
