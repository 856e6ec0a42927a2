//! Example questions shown to new users.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExampleQuestion {
    pub language: &'static str,
    pub question: &'static str,
}

const fn example(language: &'static str, question: &'static str) -> ExampleQuestion {
    ExampleQuestion { language, question }
}

/// Sample questions in several languages.
pub const EXAMPLE_QUESTIONS: &[ExampleQuestion] = &[
    example("English", "How does the immune system protect us from diseases?"),
    example("Spanish", "¿Cómo funciona el sistema inmunológico?"),
    example("French", "Comment fonctionne le système immunitaire?"),
    example("German", "Wie funktioniert das Immunsystem?"),
    example("Italian", "Come funziona il sistema immunitario?"),
    example("Portuguese", "Como funciona o sistema imunológico?"),
    example("English", "What happens inside a black hole?"),
    example("Spanish", "¿Qué pasaría si la Tierra se convirtiera en un planeta errante?"),
    example("French", "Que se passe-t-il dans un trou noir?"),
    example("German", "Was passiert in einem schwarzen Loch?"),
    example("English", "Why should we worry about nuclear war?"),
    example("Spanish", "¿Por qué deberíamos preocuparnos por la guerra nuclear?"),
];

pub const EXAMPLE_INSTRUCTIONS: &str = "You can ask questions in any language you're comfortable with! \
The system will detect your language and respond accordingly.";
