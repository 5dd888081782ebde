//! Starter project mounted when the configuration supplies no file set.

use crate::kernel::services::ports::FileSet;

pub const STARTER_INDEX_JS: &str = r#"
import express from 'express';

console.log('Hello from the browser IDE!');

// A simple Express server
const app = express();
const port = 3000;

app.get('/', (req, res) => {
  res.send('Hello World!');
});

app.listen(port, () => {
  console.log(`Server running at http://localhost:${port}/`);
});
"#;

pub const STARTER_PACKAGE_JSON: &str = r#"
{
  "name": "browser-ide-project",
  "version": "1.0.0",
  "description": "A project running in the browser",
  "main": "index.js",
  "type": "module",
  "scripts": {
    "start": "node --watch index.js"
  },
  "dependencies": {
    "express": "^4.18.2"
  }
}"#;

pub fn starter_files() -> FileSet {
    FileSet::new()
        .with_file("index.js", STARTER_INDEX_JS)
        .with_file("package.json", STARTER_PACKAGE_JSON)
}
