mod bson;
mod deserializer;
mod document;
