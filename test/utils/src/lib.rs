pub fn feedback_fixture() -> &'static str {
    return r#"
1. Español words learned: hola, adiós, gracias, por favor
2. Overall evaluation score: 4/5
3. Feedback: - Practice greetings daily - Review the accents on adiós - Try longer sentences
"#
    .trim();
}

pub fn conversation_fixture() -> Vec<(&'static str, &'static str)> {
    return vec![
        (
            "assistant",
            "¡Hola! (Hello!) Let's start with greetings. How do you say 'thank you'?",
        ),
        ("user", "gracias"),
        (
            "assistant",
            "¡Muy bien! (Very good!) Score: 5/5. Now, how do you say 'please'?",
        ),
        ("user", "por favor"),
    ];
}
