bitflags::bitflags! {
    /// Language extensions recognized by the lexer and the parser
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LanguageFeatures: u8 {
        /// C++ keywords (`class`, `template`, `namespace`, ...)
        const CXX        = 1 << 0;
        /// Qt meta-object keywords (`signals`, `slots`, `Q_SIGNAL`, `foreach`, ...)
        const QT_MOC_RUN = 1 << 1;
        /// Objective-C `@` keywords and message expressions
        const OBJC       = 1 << 2;
    }
}

impl Default for LanguageFeatures {
    fn default() -> Self {
        LanguageFeatures::CXX | LanguageFeatures::QT_MOC_RUN | LanguageFeatures::OBJC
    }
}

impl LanguageFeatures {
    pub fn cxx_only() -> Self {
        LanguageFeatures::CXX
    }

    pub fn qt_moc_run(self) -> bool {
        self.contains(LanguageFeatures::QT_MOC_RUN)
    }

    pub fn objc(self) -> bool {
        self.contains(LanguageFeatures::OBJC)
    }

    pub fn cxx(self) -> bool {
        self.contains(LanguageFeatures::CXX)
    }
}
