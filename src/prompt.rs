//! Prompt formatting and disclaimer gating
//!
//! Builds the consultant-persona prompt for the generation backend. Short
//! greetings get a distinct introduction prompt that ignores retrieved
//! context; technical questions get the full persona prompt with the
//! context embedded verbatim. The rendering surface is plain text
//! (WhatsApp), so the prompt forbids markup.

/// Simple greetings that short-circuit into the introduction prompt
const GREETINGS: &[&str] = &[
    "oi",
    "olá",
    "ola",
    "bom dia",
    "boa tarde",
    "boa noite",
    "hey",
    "e aí",
    "eai",
    "tudo bem",
];

/// A greeting carries at most this many whitespace-separated tokens
const GREETING_MAX_TOKENS: usize = 3;

/// Shown in place of context when retrieval found nothing usable
const NO_CONTEXT_PLACEHOLDER: &str =
    "Nenhuma informação específica sobre este produto foi encontrada nos documentos de referência.";

/// Response keywords that indicate prescriptive technical content
const CRITICAL_KEYWORDS: &[&str] = &[
    "dosagem",
    "dose",
    "ml",
    "litro",
    "gramas",
    "kg",
    "hectare",
    "aplicação",
    "aplicar",
    "mistura",
    "concentração",
    "diluição",
    "recomendação",
    "recomendado",
    "usar",
    "utilize",
    "quantidade",
    "proporção",
    "intervalo",
    "período",
    "frequência",
    "vezes",
    "pulverização",
    "tratamento",
    "controle",
    "combate",
];

/// At least this many distinct critical keywords before the disclaimer is
/// appended; avoids false positives on generic conversational replies
const DISCLAIMER_THRESHOLD: usize = 2;

/// Whether the query is a short greeting rather than a technical question
pub fn is_greeting(query: &str) -> bool {
    let lowered = query.trim().to_lowercase();
    lowered.split_whitespace().count() <= GREETING_MAX_TOKENS
        && GREETINGS.iter().any(|greeting| lowered.contains(greeting))
}

/// Format the prompt for the generation backend.
///
/// Greetings ignore the context entirely; everything else embeds the
/// context verbatim, or the fixed placeholder when nothing was retrieved.
pub fn format_rag_prompt(query: &str, context: &str) -> String {
    if is_greeting(query) {
        return format!(
            "Você é um consultor agrícola experiente da Synap, especializado no portfólio Syngenta.\n\n\
             Responda de forma calorosa e natural à saudação do usuário. Seja genuíno, como se fosse \
             um encontro pessoal no campo. Apresente-se brevemente e pergunte como pode ajudar.\n\n\
             Use apenas texto simples, sem formatação, e mantenha a conversa fluida e acolhedora.\n\n\
             Saudação do usuário: {}\n\nSua resposta:",
            query
        );
    }

    let context_block = if context.trim().is_empty() {
        NO_CONTEXT_PLACEHOLDER
    } else {
        context
    };

    format!(
        "Você é um consultor agrícola experiente, apaixonado por ajudar produtores rurais. Tem anos \
         de experiência no campo e conhece profundamente o portfólio de produtos Syngenta. Sua forma \
         de falar é natural, acessível e confiável - como um amigo que entende do assunto.\n\n\
         Sua missão é ajudar o usuário com a pergunta dele, oferecendo orientação prática e \
         confiável. Converse de forma fluida e humana, como se estivessem tomando um café e \
         discutindo soluções para o campo.\n\n\
         COMO RESPONDER:\n\n\
         1. **Seja Natural e Conversacional:**\n\
         \x20  - Fale como um consultor experiente falaria pessoalmente\n\
         \x20  - Use frases conectadas e fluidas, não listas robóticas\n\
         \x20  - Seja direto mas acolhedor\n\
         \x20  - Pode usar expressões naturais como \"olha\", \"veja bem\", \"é importante lembrar\"\n\n\
         2. **Estruture sua Conversa de Forma Orgânica:**\n\
         \x20  - Comece falando sobre o produto em si\n\
         \x20  - Naturalmente mencione para que serve e como funciona\n\
         \x20  - Fale sobre dosagens e aplicação quando relevante\n\
         \x20  - Sugira alternativas se conhecer\n\
         \x20  - Termine com dicas importantes ou cuidados especiais\n\n\
         3. **Use Texto Simples para WhatsApp:**\n\
         \x20  - Sem formatação Markdown (*, #, **, etc.)\n\
         \x20  - Apenas texto corrido com quebras de linha quando necessário\n\
         \x20  - Parágrafos curtos e claros\n\
         \x20  - Emojis apenas quando realmente agregarem valor\n\n\
         4. **Mantenha o Tom Profissional mas Humano:**\n\
         \x20  - Português brasileiro natural\n\
         \x20  - Explique termos técnicos de forma simples\n\
         \x20  - Seja confiável sem ser robótico\n\
         \x20  - Mostre que você realmente se importa em ajudar\n\n\
         Informações disponíveis sobre o assunto:\n\
         ---\n\
         {}\n\
         ---\n\n\
         Pergunta do usuário: {}\n\n\
         Sua resposta como consultor:",
        context_block, query
    )
}

/// Fixed safety disclaimer for plain-text rendering
pub fn disclaimer() -> &'static str {
    "\n⚠️ IMPORTANTE: Essas orientações são baseadas em informações técnicas de referência. \
     Sempre consulte um engenheiro agrônomo e leia a bula oficial antes de aplicar qualquer \
     produto. Dosagens e recomendações podem variar conforme sua região, condições locais e \
     estágio da cultura."
}

/// Whether the response carries enough prescriptive content to warrant the
/// disclaimer: at least two distinct critical keywords present.
pub fn should_include_disclaimer(response_text: &str) -> bool {
    let lowered = response_text.to_lowercase();
    let count = CRITICAL_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .count();
    count >= DISCLAIMER_THRESHOLD
}
