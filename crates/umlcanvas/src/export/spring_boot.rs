//! Spring Boot project generation.
//!
//! Every class of the diagram becomes a JPA entity with its DTO, Spring
//! Data repository, service interface, service implementation and REST
//! controller. Together with a `pom.xml`, the application class and
//! `application.properties` the files form a Maven project that is
//! returned as a zip archive.
//!
//! Interfaces are not exported. Classes are identified by their Java name;
//! later classes with an already used name are skipped.

use std::{
    collections::HashSet,
    io::{Cursor, Write},
};

use log::{debug, info, warn};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use umlcanvas_core::semantic::{ClassShape, Diagram, Field};

use crate::{config::ExportConfig, export};

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path inside the project, `/`-separated.
    pub path: String,
    pub contents: String,
}

impl GeneratedFile {
    fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// A Java class to generate, with sanitized names.
#[derive(Debug)]
struct Entity<'a> {
    name: String,
    variable: String,
    fields: Vec<(&'a Field, String, String)>,
    is_abstract: bool,
}

impl<'a> Entity<'a> {
    fn new(shape: &'a ClassShape) -> Option<Self> {
        let name = java_type_name(&shape.name)?;
        let variable = lower_first(&name);
        let fields = shape
            .fields
            .iter()
            .filter_map(|field| {
                let name = java_identifier(&field.name)?;
                // The generated primary key replaces any modeled `id`
                if name.eq_ignore_ascii_case("id") {
                    return None;
                }
                Some((field, name, java_type(&field.type_name)))
            })
            .collect();
        Some(Self {
            name,
            variable,
            fields,
            is_abstract: shape.is_abstract,
        })
    }

    fn imports(&self) -> Vec<&'static str> {
        let mut imports: Vec<&'static str> = self
            .fields
            .iter()
            .filter_map(|(_, _, java)| type_import(java))
            .collect();
        imports.sort_unstable();
        imports.dedup();
        imports
    }
}

/// Generator of Spring Boot projects.
///
/// ```
/// # use umlcanvas::config::ExportConfig;
/// # use umlcanvas::export::spring_boot::SpringBootExporter;
/// # use umlcanvas::semantic::{ClassShape, Diagram};
/// # use umlcanvas::geometry::Point;
/// let config = ExportConfig::default();
/// let exporter = SpringBootExporter::new(&config, "library");
/// let diagram = Diagram {
///     classes: vec![ClassShape::new("Book", Point::default())],
///     ..Diagram::default()
/// };
///
/// let files = exporter.generate_files(&diagram).unwrap();
/// assert!(files.iter().any(|f| f.path.ends_with("/model/Book.java")));
/// ```
#[derive(Debug)]
pub struct SpringBootExporter<'a> {
    config: &'a ExportConfig,
    project_name: String,
}

impl<'a> SpringBootExporter<'a> {
    pub fn new(config: &'a ExportConfig, project_name: impl Into<String>) -> Self {
        Self {
            config,
            project_name: project_name.into(),
        }
    }

    fn artifact_id(&self) -> String {
        let artifact: String = self
            .project_name
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        let artifact = artifact.trim_matches('-').to_string();
        if artifact.is_empty() {
            "demo".to_string()
        } else {
            artifact
        }
    }

    fn application_class(&self) -> String {
        let pascal: String = self
            .artifact_id()
            .split('-')
            .map(upper_first)
            .collect();
        format!("{pascal}Application")
    }

    fn package(&self) -> &str {
        self.config.base_package()
    }

    fn source_dir(&self) -> String {
        format!("src/main/java/{}", self.package().replace('.', "/"))
    }

    /// Generates every file of the project.
    ///
    /// # Errors
    ///
    /// [`export::Error::Empty`] when the diagram has no exportable class.
    pub fn generate_files(&self, diagram: &Diagram) -> Result<Vec<GeneratedFile>, export::Error> {
        let mut seen = HashSet::new();
        let mut entities = Vec::new();
        for shape in &diagram.classes {
            if shape.is_interface {
                debug!(class = shape.name.as_str(); "Skipping interface");
                continue;
            }
            let Some(entity) = Entity::new(shape) else {
                warn!(class = shape.name.as_str(); "Skipping class without a valid Java name");
                continue;
            };
            if !seen.insert(entity.name.clone()) {
                warn!(class = entity.name.as_str(); "Skipping duplicate class");
                continue;
            }
            entities.push(entity);
        }

        if entities.is_empty() {
            return Err(export::Error::Empty);
        }

        let dir = self.source_dir();
        let application = self.application_class();
        let mut files = vec![
            GeneratedFile::new("pom.xml", self.pom()),
            GeneratedFile::new(
                format!("{dir}/{application}.java"),
                self.application_source(&application),
            ),
            GeneratedFile::new(
                "src/main/resources/application.properties",
                self.application_properties(),
            ),
        ];

        for entity in &entities {
            let name = &entity.name;
            files.extend([
                GeneratedFile::new(format!("{dir}/model/{name}.java"), self.entity_source(entity)),
                GeneratedFile::new(format!("{dir}/dto/{name}DTO.java"), self.dto_source(entity)),
                GeneratedFile::new(
                    format!("{dir}/repository/{name}Repository.java"),
                    self.repository_source(entity),
                ),
                GeneratedFile::new(
                    format!("{dir}/service/{name}Service.java"),
                    self.service_source(entity),
                ),
                GeneratedFile::new(
                    format!("{dir}/service/impl/{name}ServiceImpl.java"),
                    self.service_impl_source(entity),
                ),
                GeneratedFile::new(
                    format!("{dir}/controller/{name}Controller.java"),
                    self.controller_source(entity),
                ),
            ]);
        }

        info!(
            project = self.artifact_id().as_str(),
            classes = entities.len(),
            files = files.len();
            "Spring Boot project generated"
        );
        Ok(files)
    }

    /// Generates the project and packs it into a zip archive.
    ///
    /// # Errors
    ///
    /// [`export::Error::Empty`] for diagrams without exportable classes, or
    /// an archive error.
    pub fn export_zip(&self, diagram: &Diagram) -> Result<Vec<u8>, export::Error> {
        let files = self.generate_files(diagram)?;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for file in &files {
            writer.start_file(file.path.as_str(), options)?;
            writer.write_all(file.contents.as_bytes())?;
        }
        let cursor = writer.finish()?;

        Ok(cursor.into_inner())
    }

    fn pom(&self) -> String {
        let group = self.package().rsplit_once('.').map_or(self.package(), |(group, _)| group);
        let artifact = self.artifact_id();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd">
    <modelVersion>4.0.0</modelVersion>

    <parent>
        <groupId>org.springframework.boot</groupId>
        <artifactId>spring-boot-starter-parent</artifactId>
        <version>3.3.4</version>
        <relativePath/>
    </parent>

    <groupId>{group}</groupId>
    <artifactId>{artifact}</artifactId>
    <version>0.0.1-SNAPSHOT</version>
    <name>{artifact}</name>

    <properties>
        <java.version>17</java.version>
    </properties>

    <dependencies>
        <dependency>
            <groupId>org.springframework.boot</groupId>
            <artifactId>spring-boot-starter-web</artifactId>
        </dependency>
        <dependency>
            <groupId>org.springframework.boot</groupId>
            <artifactId>spring-boot-starter-data-jpa</artifactId>
        </dependency>
        <dependency>
            <groupId>com.h2database</groupId>
            <artifactId>h2</artifactId>
            <scope>runtime</scope>
        </dependency>
        <dependency>
            <groupId>org.projectlombok</groupId>
            <artifactId>lombok</artifactId>
            <optional>true</optional>
        </dependency>
        <dependency>
            <groupId>org.springframework.boot</groupId>
            <artifactId>spring-boot-starter-test</artifactId>
            <scope>test</scope>
        </dependency>
    </dependencies>

    <build>
        <plugins>
            <plugin>
                <groupId>org.springframework.boot</groupId>
                <artifactId>spring-boot-maven-plugin</artifactId>
            </plugin>
        </plugins>
    </build>
</project>
"#
        )
    }

    fn application_source(&self, class: &str) -> String {
        format!(
            "package {package};

import org.springframework.boot.SpringApplication;
import org.springframework.boot.autoconfigure.SpringBootApplication;

@SpringBootApplication
public class {class} {{

    public static void main(String[] args) {{
        SpringApplication.run({class}.class, args);
    }}
}}
",
            package = self.package()
        )
    }

    fn application_properties(&self) -> String {
        format!(
            "spring.application.name={}
spring.datasource.url=jdbc:h2:mem:{}
spring.jpa.hibernate.ddl-auto=update
spring.h2.console.enabled=true
",
            self.artifact_id(),
            self.artifact_id().replace('-', "_")
        )
    }

    fn entity_source(&self, entity: &Entity) -> String {
        let mut out = format!("package {}.model;\n\n", self.package());
        out.push_str("import jakarta.persistence.*;\nimport lombok.*;\n");
        for import in entity.imports() {
            out.push_str(&format!("import {import};\n"));
        }
        out.push_str("\n@Entity\n@Data\n@NoArgsConstructor\n@AllArgsConstructor\n");
        let modifier = if entity.is_abstract { "public abstract" } else { "public" };
        out.push_str(&format!("{modifier} class {} {{\n\n", entity.name));
        out.push_str("    @Id\n    @GeneratedValue(strategy = GenerationType.IDENTITY)\n");
        out.push_str("    private Long id;\n");
        for (field, name, java) in &entity.fields {
            out.push('\n');
            if let Some(default) = field.default_value.as_deref().filter(|d| !d.is_empty()) {
                out.push_str(&format!("    private {java} {name} = {default};\n"));
            } else {
                out.push_str(&format!("    private {java} {name};\n"));
            }
        }
        out.push_str("}\n");
        out
    }

    fn dto_source(&self, entity: &Entity) -> String {
        let mut out = format!("package {}.dto;\n\n", self.package());
        out.push_str("import lombok.*;\n");
        for import in entity.imports() {
            out.push_str(&format!("import {import};\n"));
        }
        out.push_str("\n@Data\n@NoArgsConstructor\n@AllArgsConstructor\n");
        out.push_str(&format!("public class {}DTO {{\n\n", entity.name));
        out.push_str("    private Long id;\n");
        for (_, name, java) in &entity.fields {
            out.push_str(&format!("    private {java} {name};\n"));
        }
        out.push_str("}\n");
        out
    }

    fn repository_source(&self, entity: &Entity) -> String {
        let package = self.package();
        let name = &entity.name;
        format!(
            "package {package}.repository;

import {package}.model.{name};
import org.springframework.data.jpa.repository.JpaRepository;
import org.springframework.stereotype.Repository;

@Repository
public interface {name}Repository extends JpaRepository<{name}, Long> {{
}}
"
        )
    }

    fn service_source(&self, entity: &Entity) -> String {
        let package = self.package();
        let name = &entity.name;
        let var = &entity.variable;
        format!(
            "package {package}.service;

import {package}.model.{name};
import java.util.List;

public interface {name}Service {{
    {name} save({name} {var});
    List<{name}> findAll();
    {name} findById(Long id);
    void deleteById(Long id);
}}
"
        )
    }

    fn service_impl_source(&self, entity: &Entity) -> String {
        let package = self.package();
        let name = &entity.name;
        let var = &entity.variable;
        format!(
            "package {package}.service.impl;

import {package}.model.{name};
import {package}.repository.{name}Repository;
import {package}.service.{name}Service;
import org.springframework.stereotype.Service;
import java.util.List;

@Service
public class {name}ServiceImpl implements {name}Service {{

    private final {name}Repository repository;

    public {name}ServiceImpl({name}Repository repository) {{
        this.repository = repository;
    }}

    @Override
    public {name} save({name} {var}) {{
        return repository.save({var});
    }}

    @Override
    public List<{name}> findAll() {{
        return repository.findAll();
    }}

    @Override
    public {name} findById(Long id) {{
        return repository.findById(id).orElse(null);
    }}

    @Override
    public void deleteById(Long id) {{
        repository.deleteById(id);
    }}
}}
"
        )
    }

    fn controller_source(&self, entity: &Entity) -> String {
        let package = self.package();
        let name = &entity.name;
        let var = &entity.variable;
        let route = format!("{}s", entity.name.to_lowercase());
        format!(
            "package {package}.controller;

import {package}.model.{name};
import {package}.service.{name}Service;
import org.springframework.http.ResponseEntity;
import org.springframework.web.bind.annotation.*;
import java.util.List;

@RestController
@RequestMapping(\"/api/{route}\")
public class {name}Controller {{

    private final {name}Service service;

    public {name}Controller({name}Service service) {{
        this.service = service;
    }}

    @GetMapping
    public List<{name}> findAll() {{
        return service.findAll();
    }}

    @GetMapping(\"/{{id}}\")
    public ResponseEntity<{name}> findById(@PathVariable Long id) {{
        {name} {var} = service.findById(id);
        return {var} == null ? ResponseEntity.notFound().build() : ResponseEntity.ok({var});
    }}

    @PostMapping
    public {name} create(@RequestBody {name} {var}) {{
        return service.save({var});
    }}

    @DeleteMapping(\"/{{id}}\")
    public ResponseEntity<Void> delete(@PathVariable Long id) {{
        service.deleteById(id);
        return ResponseEntity.noContent().build();
    }}
}}
"
        )
    }
}

/// Maps a modeled type to the Java type used in entities.
///
/// Primitives become their wrapper types so that columns may be null. SQL
/// column types are accepted with or without a size (`VARCHAR(255)`).
/// Unknown types are kept as written.
pub fn java_type(modeled: &str) -> String {
    let trimmed = modeled.trim();
    let base = match trimmed.split_once('(') {
        Some((name, rest)) if rest.ends_with(')') => name.trim_end(),
        _ => trimmed,
    };
    let mapped = match base.to_ascii_lowercase().as_str() {
        "" | "string" | "str" | "text" | "char[]" => "String",
        "varchar" | "nvarchar" | "character varying" | "clob" => "String",
        "int" | "integer" => "Integer",
        "long" | "bigint" => "Long",
        "short" => "Short",
        "byte" => "Byte",
        "double" | "number" => "Double",
        "float" | "real" => "Float",
        "bool" | "boolean" => "Boolean",
        "char" | "character" => "Character",
        "decimal" | "bigdecimal" | "money" => "BigDecimal",
        "date" | "localdate" => "LocalDate",
        "datetime" | "localdatetime" | "timestamp" => "LocalDateTime",
        "time" | "localtime" => "LocalTime",
        "uuid" => "UUID",
        _ => return trimmed.to_string(),
    };
    mapped.to_string()
}

fn type_import(java: &str) -> Option<&'static str> {
    let base = java.split('<').next().unwrap_or(java);
    match base {
        "BigDecimal" => Some("java.math.BigDecimal"),
        "LocalDate" => Some("java.time.LocalDate"),
        "LocalDateTime" => Some("java.time.LocalDateTime"),
        "LocalTime" => Some("java.time.LocalTime"),
        "UUID" => Some("java.util.UUID"),
        "List" => Some("java.util.List"),
        "Set" => Some("java.util.Set"),
        "Map" => Some("java.util.Map"),
        _ => None,
    }
}

/// Strips characters Java does not accept in identifiers. `None` when
/// nothing usable is left.
fn java_identifier(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches("()")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    let cleaned = cleaned.trim_start_matches(|c: char| c.is_ascii_digit());
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn java_type_name(raw: &str) -> Option<String> {
    java_identifier(raw).map(|name| upper_first(&name))
}

fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    chars
        .next()
        .map(|first| first.to_lowercase().chain(chars).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use umlcanvas_core::{
        geometry::Point,
        semantic::{Field, Visibility},
    };

    use super::*;

    fn library() -> Diagram {
        let mut book = ClassShape::new("Book", Point::default())
            .with_field(Field::new(Visibility::Private, "id", "int"))
            .with_field(Field::new(Visibility::Private, "title", "String"))
            .with_field(Field::new(Visibility::Private, "published", "date"))
            .with_field(Field::new(Visibility::Private, "price", "decimal"));
        book.fields[1].default_value = Some("\"untitled\"".to_string());

        let mut searchable = ClassShape::new("Searchable", Point::default());
        searchable.is_interface = true;

        Diagram {
            name: Some("City Library".to_string()),
            classes: vec![
                book,
                ClassShape::new("library member", Point::default()),
                searchable,
                ClassShape::new("Book", Point::default()),
            ],
            connections: vec![],
        }
    }

    #[test]
    fn test_generated_paths() {
        let config = ExportConfig::default();
        let files = SpringBootExporter::new(&config, "City Library")
            .generate_files(&library())
            .unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();

        let dir = "src/main/java/com/example/demo";
        assert!(paths.contains(&"pom.xml"));
        assert!(paths.contains(&"src/main/resources/application.properties"));
        assert!(paths.contains(&format!("{dir}/CityLibraryApplication.java").as_str()));
        for suffix in [
            "model/Book.java",
            "dto/BookDTO.java",
            "repository/BookRepository.java",
            "service/BookService.java",
            "service/impl/BookServiceImpl.java",
            "controller/BookController.java",
            "model/Librarymember.java",
        ] {
            assert!(
                paths.contains(&format!("{dir}/{suffix}").as_str()),
                "missing {suffix}"
            );
        }
        assert!(!paths.iter().any(|p| p.contains("Searchable")));
        // Two classes, six files each, plus the three project files
        assert_eq!(files.len(), 15);
    }

    #[test]
    fn test_entity_source() {
        let config = ExportConfig::new("org.acme.shop");
        let files = SpringBootExporter::new(&config, "shop")
            .generate_files(&library())
            .unwrap();
        let entity = files
            .iter()
            .find(|f| f.path.ends_with("/model/Book.java"))
            .unwrap();

        assert!(entity.contents.starts_with("package org.acme.shop.model;"));
        assert!(entity.contents.contains("import java.math.BigDecimal;"));
        assert!(entity.contents.contains("import java.time.LocalDate;"));
        assert!(entity.contents.contains("private String title = \"untitled\";"));
        assert!(entity.contents.contains("private LocalDate published;"));
        assert_eq!(entity.contents.matches("private Long id;").count(), 1);
        assert!(!entity.contents.contains("Integer id"));

        let pom = files.iter().find(|f| f.path == "pom.xml").unwrap();
        assert!(pom.contents.contains("<groupId>org.acme</groupId>"));
        assert!(pom.contents.contains("<artifactId>shop</artifactId>"));
    }

    #[test]
    fn test_controller_route() {
        let config = ExportConfig::default();
        let files = SpringBootExporter::new(&config, "demo")
            .generate_files(&library())
            .unwrap();
        let controller = files
            .iter()
            .find(|f| f.path.ends_with("BookController.java"))
            .unwrap();
        assert!(controller.contents.contains("@RequestMapping(\"/api/books\")"));
        assert!(controller.contents.contains("@GetMapping(\"/{id}\")"));
    }

    #[test]
    fn test_zip_contains_every_file() {
        let config = ExportConfig::default();
        let exporter = SpringBootExporter::new(&config, "demo");
        let bytes = exporter.export_zip(&library()).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 15);

        let mut pom = String::new();
        archive
            .by_name("pom.xml")
            .unwrap()
            .read_to_string(&mut pom)
            .unwrap();
        assert!(pom.contains("spring-boot-starter-data-jpa"));
    }

    #[test]
    fn test_nothing_to_export() {
        let config = ExportConfig::default();
        let mut interface = ClassShape::new("Repo", Point::default());
        interface.is_interface = true;
        let diagram = Diagram {
            classes: vec![interface],
            ..Diagram::default()
        };
        assert!(matches!(
            SpringBootExporter::new(&config, "demo").export_zip(&diagram),
            Err(export::Error::Empty)
        ));
    }

    #[test]
    fn test_java_type_mapping() {
        assert_eq!(java_type("int"), "Integer");
        assert_eq!(java_type(" Boolean "), "Boolean");
        assert_eq!(java_type("List<Book>"), "List<Book>");
        assert_eq!(java_type(""), "String");
        assert_eq!(java_type("VARCHAR(255)"), "String");
        assert_eq!(java_type("DECIMAL(10,2)"), "BigDecimal");
        assert_eq!(java_type("INT"), "Integer");
        assert_eq!(java_type("TIMESTAMP"), "LocalDateTime");
        assert_eq!(java_type("Map(K"), "Map(K");
        assert_eq!(type_import("List<Book>"), Some("java.util.List"));
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(java_identifier("getId()"), Some("getId".to_string()));
        assert_eq!(java_identifier("2nd place"), Some("ndplace".to_string()));
        assert_eq!(java_identifier("!!"), None);
        assert_eq!(java_type_name("order_line"), Some("Order_line".to_string()));
    }
}
