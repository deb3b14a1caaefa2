use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var("WOLFCALL_PROVIDER")
            && !provider.is_empty()
        {
            self.llm.provider = provider;
        }

        let provider_key_var = if self.llm.provider == "gemini" {
            "GEMINI_API_KEY"
        } else {
            "OPENAI_API_KEY"
        };
        if let Ok(key) = std::env::var("WOLFCALL_API_KEY").or_else(|_| std::env::var(provider_key_var))
            && !key.is_empty()
        {
            self.llm.api_key = Some(key);
        }

        if let Ok(host) = std::env::var("WOLFCALL_HOST")
            && !host.is_empty()
        {
            self.connection.host = host;
        }

        if let Ok(port_str) = std::env::var("WOLFCALL_PORT")
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.connection.port = port;
        }

        if let Ok(name) = std::env::var("WOLFCALL_NAME")
            && !name.is_empty()
        {
            self.agent.name = name;
        }
    }
}
