//! Sample documents shared by tests.

/// A `package.json` with scripts and every dependency table.
pub const SAMPLE_PACKAGE_JSON: &str = r#"{
  "name": "demo-app",
  "version": "1.2.3",
  "private": true,
  "scripts": {
    "build": "tsc -p .",
    "test": "jest"
  },
  "dependencies": {
    "lodash": "^4.17.21"
  },
  "devDependencies": {
    "typescript": "~5.4.0"
  },
  "peerDependencies": {
    "react": ">=18"
  }
}"#;

/// A hand-written `tsconfig.json` containing comments.
pub const SAMPLE_TSCONFIG_JSONC: &str = r#"{
  // Shared base settings
  "extends": "./tsconfig.base.json",
  "compilerOptions": {
    "strict": true, /* keep this on */
    "outDir": "dist",
    "target": "ES2022"
  },
  "include": ["src/**/*.ts"],
  "exclude": ["node_modules"]
}"#;

/// A small YAML document.
pub const SAMPLE_YAML: &str = "name: demo\nsteps:\n- build\n- test\n";
