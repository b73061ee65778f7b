//! Test template rendering
//!
//! Templates are plain text with `${name}` placeholders. Rendering is a single
//! literal substitution pass: there are no conditionals, loops or
//! expressions, and a placeholder whose name has no value is kept verbatim.
//!
//! # Example
//!
//! ```rust
//! use test_file_generator::template::{render, TemplateVariables};
//!
//! let vars = TemplateVariables::for_component("Button", "../Button");
//! let out = render("import ${componentName} from '${componentPath}';", &vars);
//! assert_eq!(out, "import Button from '../Button';");
//! ```

mod placeholder;
mod variables;

pub use placeholder::{placeholders, render, unknown_placeholders};
pub use variables::{TemplateVariables, COMPONENT_NAME, COMPONENT_PATH, FILE_NAME};

/// Template used when none is configured
pub const DEFAULT_TEMPLATE: &str = r"import { render, screen } from '@testing-library/react';
import '@testing-library/jest-dom';
import ${componentName} from '${componentPath}';

describe('${componentName}', () => {
    it('should render successfully', () => {
        render(<${componentName} />);
        expect(screen).toBeTruthy();
    });
});";
